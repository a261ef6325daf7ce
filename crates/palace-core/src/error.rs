//! Error taxonomy for the palace core.

use thiserror::Error;

pub type PalaceResult<T> = Result<T, PalaceError>;

#[derive(Error, Debug)]
pub enum PalaceError {
    /// Submission attempted before every question has an answer.
    #[error("Test incompleto: {answered} de {required} preguntas respondidas")]
    IncompleteAnswers { answered: usize, required: usize },

    /// A category tag outside the closed vocabulary.
    #[error("Unknown category tag: {0:?}")]
    InvalidCategory(String),

    #[error("Question index {index} out of range (questionnaire has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model endpoint error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Model endpoint rate limit exceeded")]
    RateLimited,

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PalaceError {
    /// True for errors caused by the caller's input rather than by a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::IncompleteAnswers { .. }
                | Self::InvalidCategory(_)
                | Self::QuestionOutOfRange { .. }
                | Self::NotFound(_)
                | Self::Validation(_)
                | Self::Forbidden(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_answers_message_names_counts() {
        let err = PalaceError::IncompleteAnswers {
            answered: 15,
            required: 16,
        };
        assert_eq!(err.to_string(), "Test incompleto: 15 de 16 preguntas respondidas");
        assert!(err.is_client_error());
    }

    #[test]
    fn upstream_errors_are_not_client_errors() {
        assert!(!PalaceError::RateLimited.is_client_error());
        assert!(!PalaceError::Upstream {
            status: 500,
            body: String::new()
        }
        .is_client_error());
    }
}
