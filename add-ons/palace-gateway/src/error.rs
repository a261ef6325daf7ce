//! Maps core errors to HTTP responses: `{"error": "<message>"}` with a matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use palace_core::PalaceError;

pub struct ApiError(pub PalaceError);

impl From<PalaceError> for ApiError {
    fn from(e: PalaceError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PalaceError::IncompleteAnswers { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PalaceError::InvalidCategory(_)
            | PalaceError::QuestionOutOfRange { .. }
            | PalaceError::Validation(_) => StatusCode::BAD_REQUEST,
            PalaceError::NotFound(_) => StatusCode::NOT_FOUND,
            PalaceError::Forbidden(_) => StatusCode::FORBIDDEN,
            PalaceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            tracing::debug!(target: "palace::gateway", error = %self.0, "Request rejected");
        } else {
            tracing::error!(target: "palace::gateway", error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
