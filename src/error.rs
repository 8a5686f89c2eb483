use thiserror::Error;

use crate::services::CollaboratorError;

/// Errors surfaced by matchmaking operations
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid input: transcript is empty")]
    EmptyTranscript,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed profile {user_id}: field `{field}` {reason}")]
    MalformedProfile {
        user_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Malformed collaborator response: {0}")]
    MalformedResponse(String),
}

impl From<CollaboratorError> for MatchError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::InvalidResponse(msg) => MatchError::MalformedResponse(msg),
            other => MatchError::CollaboratorUnavailable(other.to_string()),
        }
    }
}

impl MatchError {
    /// Short machine-readable code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::InvalidInput(_) => "invalid_input",
            MatchError::EmptyTranscript => "empty_transcript",
            MatchError::NotFound(_) => "not_found",
            MatchError::MalformedProfile { .. } => "malformed_profile",
            MatchError::StorageFailure(_) | MatchError::MigrateError(_) => "storage_failure",
            MatchError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            MatchError::MalformedResponse(_) => "malformed_response",
        }
    }
}
