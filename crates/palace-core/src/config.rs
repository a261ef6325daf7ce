//! Palace configuration: TOML file + environment, loaded through the `config` crate.
//!
//! | Source | Example |
//! |--------|---------|
//! | defaults | `port = 8010`, `storage_path = "./data"` |
//! | file (`PALACE_CONFIG`, default `config/palace.toml`) | `llm_model = "google/gemini-2.5-flash"` |
//! | env (`PALACE__<FIELD>`) | `PALACE__PORT=9000` |
//!
//! The model API key is never read from the file; see [`PalaceConfig::llm_api_key`].

use crate::error::PalaceResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LLM_API_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_LLM_MODEL: &str = "google/gemini-2.5-flash";

fn default_true() -> bool {
    true
}

fn default_session_idle_secs() -> u64 {
    DEFAULT_SESSION_IDLE_SECS
}

pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalaceConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// Base directory for the sled record store.
    pub storage_path: String,
    /// OpenAI-compatible base URL; `/chat/completions` is appended.
    pub llm_api_url: String,
    pub llm_model: String,
    /// Reject unknown category tags instead of dropping them.
    #[serde(default)]
    pub strict_categories: bool,
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
    /// Palace sessions untouched for this long are dropped by the gateway sweep.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for PalaceConfig {
    fn default() -> Self {
        Self {
            app_name: "Mental Palace".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8010,
            storage_path: "./data".to_string(),
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            strict_categories: false,
            cors_allow_any: true,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

impl PalaceConfig {
    /// Load config from file and environment. Precedence: env > file > defaults.
    pub fn load() -> PalaceResult<Self> {
        let config_path =
            std::env::var("PALACE_CONFIG").unwrap_or_else(|_| "config/palace.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`PalaceConfig::load`] with an explicit file path (a missing file is skipped).
    pub fn load_from(path: &Path) -> PalaceResult<Self> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", d.app_name)?
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("storage_path", d.storage_path)?
            .set_default("llm_api_url", d.llm_api_url)?
            .set_default("llm_model", d.llm_model)?
            .set_default("strict_categories", d.strict_categories)?
            .set_default("cors_allow_any", d.cors_allow_any)?
            .set_default("session_idle_secs", d.session_idle_secs as i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("PALACE").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Directory of the sled record store.
    pub fn records_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("palace_records")
    }

    /// Bind address for the gateway.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model API key. Priority: PALACE_LLM_API_KEY > LLM_API_KEY. Blank values count as unset.
    pub fn llm_api_key() -> Option<String> {
        env_opt_string("PALACE_LLM_API_KEY").or_else(|| env_opt_string("LLM_API_KEY"))
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PalaceConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.app_name, "Mental Palace");
        assert_eq!(cfg.llm_model, DEFAULT_LLM_MODEL);
        assert!(!cfg.strict_categories);
        assert!(cfg.cors_allow_any);
        assert_eq!(cfg.session_idle_secs, DEFAULT_SESSION_IDLE_SECS);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palace.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "storage_path = \"/tmp/palace\"\nstrict_categories = true").unwrap();
        drop(f);

        let cfg = PalaceConfig::load_from(&path).unwrap();
        assert_eq!(cfg.storage_path, "/tmp/palace");
        assert!(cfg.strict_categories);
        assert_eq!(cfg.records_path(), Path::new("/tmp/palace").join("palace_records"));
    }
}
