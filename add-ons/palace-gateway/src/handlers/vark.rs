//! Questionnaire, scoring, submission and profiles.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use palace_core::{
    submit_answers, total_questions, vark::score, AnswerSet, AppRole, PalaceError, VarkCategory,
    VarkResult, QUESTIONNAIRE,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Deserialize)]
pub struct ScoreRequest {
    /// Question index (0-based) -> category tag.
    #[serde(default)]
    pub answers: BTreeMap<usize, String>,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub user_id: String,
    #[serde(default)]
    pub answers: BTreeMap<usize, String>,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: AppRole,
}

fn parse_answers(state: &AppState, raw: &BTreeMap<usize, String>) -> Result<AnswerSet, PalaceError> {
    AnswerSet::from_tags(
        raw.iter().map(|(i, tag)| (*i, tag.as_str())),
        total_questions(),
        state.config.strict_categories,
    )
}

fn result_json(result: &VarkResult) -> Value {
    let total = total_questions();
    let breakdown: Vec<Value> = VarkCategory::ALL
        .iter()
        .map(|c| {
            json!({
                "category": c,
                "label": c.label(),
                "score": result.scores.get(*c),
                "percent": result.scores.percent(*c, total),
            })
        })
        .collect();
    json!({
        "scores": result.scores,
        "dominant": result.dominant,
        "dominant_label": result.dominant.label(),
        "dominant_description": result.dominant.description(),
        "breakdown": breakdown,
    })
}

/// GET /api/v1/vark/questions
pub async fn questions() -> Json<Value> {
    let categories: Vec<Value> = VarkCategory::ALL
        .iter()
        .map(|c| json!({ "id": c, "label": c.label(), "description": c.description() }))
        .collect();
    Json(json!({
        "total": total_questions(),
        "questions": QUESTIONNAIRE,
        "categories": categories,
    }))
}

/// POST /api/v1/vark/score: progress display; incomplete sets are allowed.
pub async fn score_answers(
    State(state): State<AppState>,
    Json(body): Json<ScoreRequest>,
) -> ApiResult<Json<Value>> {
    let answers = parse_answers(&state, &body.answers)?;
    let total = total_questions();
    let result = score(&answers, total);
    let mut out = result_json(&result);
    out["answered"] = json!(answers.len());
    out["total"] = json!(total);
    out["complete"] = json!(answers.is_complete(total));
    out["progress_percent"] = json!(answers.progress_percent(total));
    Ok(Json(out))
}

/// POST /api/v1/vark/submit
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> ApiResult<Json<Value>> {
    let answers = parse_answers(&state, &body.answers)?;
    let (result, profile) = submit_answers(&state.records, &body.user_id, &answers, total_questions())?;
    let mut out = result_json(&result);
    out["profile"] = json!(profile);
    Ok(Json(out))
}

/// GET /api/v1/profiles/:user_id
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let profile = state
        .records
        .get_profile(&user_id)?
        .ok_or_else(|| PalaceError::NotFound(format!("profile {}", user_id)))?;
    Ok(Json(json!({
        "needs_questionnaire": profile.needs_questionnaire(),
        "profile": profile,
    })))
}

/// POST /api/v1/profiles/:user_id/role
pub async fn set_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<RoleRequest>,
) -> ApiResult<Json<Value>> {
    let profile = state.records.set_role(&user_id, body.role)?;
    Ok(Json(json!({ "profile": profile })))
}

/// GET /api/v1/profiles/:user_id/enrollments
pub async fn enrollments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let enrollments = state.records.enrollments_for(&user_id)?;
    Ok(Json(json!({ "enrollments": enrollments })))
}
