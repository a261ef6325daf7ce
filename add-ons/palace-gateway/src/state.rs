//! Shared gateway state.

use dashmap::DashMap;
use palace_core::{PalaceConfig, PalaceSnapshot, PalaceStore, RecordStore, StudyPlanGenerator};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A session's interaction store and the last time a request touched it.
pub struct Session {
    pub store: PalaceStore,
    pub last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PalaceConfig>,
    pub records: Arc<RecordStore>,
    /// One interaction store per browser session, created on first mutation.
    pub sessions: Arc<DashMap<String, Session>>,
    pub generator: Arc<dyn StudyPlanGenerator>,
}

impl AppState {
    pub fn new(
        config: PalaceConfig,
        records: RecordStore,
        generator: Arc<dyn StudyPlanGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            records: Arc::new(records),
            sessions: Arc::new(DashMap::new()),
            generator,
        }
    }

    /// Run `f` against the session's store, creating the store if needed.
    pub fn with_session<R>(&self, session: &str, f: impl FnOnce(&mut PalaceStore) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(session.to_string())
            .or_insert_with(|| {
                tracing::info!(target: "palace::gateway", session, "New palace session");
                Session {
                    store: PalaceStore::new(),
                    last_seen: Instant::now(),
                }
            });
        entry.last_seen = Instant::now();
        f(&mut entry.store)
    }

    /// Snapshot without creating a session: unknown ids see the initial state.
    pub fn snapshot(&self, session: &str) -> PalaceSnapshot {
        match self.sessions.get_mut(session) {
            Some(mut entry) => {
                entry.last_seen = Instant::now();
                entry.store.snapshot()
            }
            None => PalaceStore::new().snapshot(),
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.session_idle_secs)
    }

    /// Drop sessions idle for at least `max_idle`. Returns how many were removed.
    pub fn evict_idle_sessions(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.last_seen.elapsed() < max_idle);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(
                target: "palace::gateway",
                evicted,
                remaining = self.sessions.len(),
                "Evicted idle palace sessions"
            );
        }
        evicted
    }
}
