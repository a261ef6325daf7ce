//! Courses, enrollment, materials and the furnished room view.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use palace_core::{generate_missing_plans, place_modules, MaterialKind, NewCourse, PalaceError};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct ListQuery {
    pub professor_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub professor_id: String,
    #[serde(flatten)]
    pub course: NewCourse,
}

#[derive(Deserialize)]
pub struct StudentRequest {
    pub student_id: String,
}

#[derive(Deserialize)]
pub struct StudentQuery {
    pub student_id: Option<String>,
}

#[derive(Deserialize)]
pub struct MaterialsRequest {
    pub professor_id: String,
    pub kind: MaterialKind,
    pub urls: Vec<String>,
}

/// GET /api/v1/courses
pub async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> ApiResult<Json<Value>> {
    let courses = match q.professor_id {
        Some(professor_id) => state.records.courses_by_professor(&professor_id)?,
        None => state.records.list_courses()?,
    };
    Ok(Json(json!({ "courses": courses })))
}

/// POST /api/v1/courses
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateCourseRequest>,
) -> ApiResult<Json<Value>> {
    let (course, modules) = state.records.create_course(&body.professor_id, body.course)?;
    Ok(Json(json!({ "course": course, "modules": modules })))
}

/// GET /api/v1/courses/:id/modules
pub async fn modules(State(state): State<AppState>, Path(course_id): Path<String>) -> ApiResult<Json<Value>> {
    let course = state
        .records
        .get_course(&course_id)?
        .ok_or_else(|| PalaceError::NotFound(format!("course {}", course_id)))?;
    let modules = state.records.list_modules(&course_id)?;
    Ok(Json(json!({ "course": course, "modules": modules })))
}

/// GET /api/v1/courses/:id/furniture?student_id=
///
/// First six modules placed on the room furniture; `has_plan` reflects the student's palace.
pub async fn furniture(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Query(q): Query<StudentQuery>,
) -> ApiResult<Json<Value>> {
    let course = state
        .records
        .get_course(&course_id)?
        .ok_or_else(|| PalaceError::NotFound(format!("course {}", course_id)))?;
    let modules = state.records.list_modules(&course_id)?;
    let palace = match q.student_id {
        Some(student_id) => state.records.find_palace(&student_id, &course_id)?,
        None => None,
    };
    let plans = match palace {
        Some(palace) => state.records.study_plans(&palace.id)?,
        None => Vec::new(),
    };
    let placements = place_modules(&modules, &plans);
    Ok(Json(json!({
        "course": course,
        "room_label": course.room_type.label(),
        "furniture": placements,
    })))
}

/// POST /api/v1/courses/:id/enroll
pub async fn enroll(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(body): Json<StudentRequest>,
) -> ApiResult<Json<Value>> {
    let (enrollment, palace) = state.records.enroll(&body.student_id, &course_id)?;
    Ok(Json(json!({ "enrollment": enrollment, "palace": palace })))
}

/// POST /api/v1/courses/:id/materials
pub async fn materials(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(body): Json<MaterialsRequest>,
) -> ApiResult<Json<Value>> {
    let course = state
        .records
        .attach_materials(&course_id, &body.professor_id, body.kind, body.urls)?;
    Ok(Json(json!({ "course": course })))
}

/// POST /api/v1/courses/:id/study-plans
pub async fn study_plans(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(body): Json<StudentRequest>,
) -> ApiResult<Json<Value>> {
    let plans =
        generate_missing_plans(&state.records, state.generator.as_ref(), &body.student_id, &course_id).await?;
    Ok(Json(json!({ "plans": plans })))
}
