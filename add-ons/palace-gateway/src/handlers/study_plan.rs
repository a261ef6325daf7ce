//! Single-module study plan generation.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use palace_core::{generate_or_empty, PlanRequest};
use serde_json::{json, Value};

/// POST /api/v1/study-plan
///
/// Always answers with a plan; generation failures yield the empty plan.
pub async fn generate(State(state): State<AppState>, Json(request): Json<PlanRequest>) -> Json<Value> {
    let plan = generate_or_empty(state.generator.as_ref(), &request).await;
    Json(json!({ "studyPlan": plan }))
}
