//! Error kinds surfaced by the service layer and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::db::DbLockError;
use crate::srs::ProficiencyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Card or deck absent, or owned by someone else
    NotFound(String),
    InvalidArgument(String),
    /// Lost a concurrent update; retry with fresh state
    Conflict(String),
    /// Store failure
    Unavailable(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::InvalidArgument(msg)
            | Self::Conflict(msg)
            | Self::Unavailable(msg) => msg,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        tracing::error!("Store error: {}", e);
        Self::Unavailable("Database error".to_string())
    }
}

impl From<DbLockError> for ServiceError {
    fn from(e: DbLockError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<ProficiencyError> for ServiceError {
    fn from(e: ProficiencyError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }
}
