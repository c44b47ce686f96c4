//! JSON handlers. Each one resolves the caller, locks the store, reads the
//! clock once and hands off to a service.

pub mod cards;
pub mod decks;
pub mod materials;
pub mod review;

pub use cards::*;
pub use decks::*;
pub use materials::*;
pub use review::*;

use axum::{extract::rejection::JsonRejection, Json};

use crate::error::{ServiceError, ServiceResult};

pub async fn health() -> &'static str {
  "ok"
}

/// Unwrap a JSON body, reporting malformed or mistyped input as 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ServiceResult<T> {
  match payload {
    Ok(Json(body)) => Ok(body),
    Err(rejection) => Err(ServiceError::InvalidArgument(rejection.body_text())),
  }
}
