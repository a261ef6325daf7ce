//! Per-session palace interaction endpoints.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use palace_core::{NewTask, PalaceError, PalaceSnapshot};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct SelectRequest {
    /// Furniture tag, or null to clear the selection.
    #[serde(default)]
    pub furniture: Option<String>,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// GET /api/v1/palace/:session
pub async fn snapshot(State(state): State<AppState>, Path(session): Path<String>) -> Json<PalaceSnapshot> {
    Json(state.snapshot(&session))
}

/// POST /api/v1/palace/:session/select
pub async fn select(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<SelectRequest>,
) -> ApiResult<Json<PalaceSnapshot>> {
    let snapshot = state.with_session(&session, |store| {
        store.select_tag(body.furniture.as_deref())?;
        Ok::<_, PalaceError>(store.snapshot())
    })?;
    Ok(Json(snapshot))
}

/// POST /api/v1/palace/:session/assistant/toggle
pub async fn toggle_assistant(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<PalaceSnapshot> {
    Json(state.with_session(&session, |store| {
        store.toggle_assistant();
        store.snapshot()
    }))
}

/// POST /api/v1/palace/:session/assistant/message
pub async fn set_message(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Json<PalaceSnapshot> {
    Json(state.with_session(&session, |store| {
        store.set_assistant_message(body.message);
        store.snapshot()
    }))
}

/// POST /api/v1/palace/:session/items/:id/complete
///
/// Unknown or already-completed ids are a no-op reported as `completed: false`.
pub async fn complete_item(
    State(state): State<AppState>,
    Path((session, item_id)): Path<(String, String)>,
) -> Json<Value> {
    let (completed, snapshot) = state.with_session(&session, |store| {
        let completed = store.complete_item(&item_id);
        (completed, store.snapshot())
    });
    Json(json!({ "completed": completed, "palace": snapshot }))
}

/// POST /api/v1/palace/:session/tasks
pub async fn add_task(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(task): Json<NewTask>,
) -> ApiResult<Json<Value>> {
    if task.title.trim().is_empty() {
        return Err(PalaceError::Validation("task title is empty".into()).into());
    }
    let (id, snapshot) = state.with_session(&session, |store| {
        let id = store.add_pending_task(task);
        (id, store.snapshot())
    });
    Ok(Json(json!({ "id": id, "palace": snapshot })))
}
