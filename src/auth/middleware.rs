//! Identity extractor.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::state::AppState;

/// Header carrying the caller's user id, set by the fronting identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated request context.
/// Add this as a handler parameter to require an identity; every store
/// access is scoped to `user_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "error": "Missing user identity" })),
                )
                    .into_response()
            })?;

        Ok(AuthContext {
            user_id: user_id.to_string(),
        })
    }
}
