use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::json_body;
use crate::auth::AuthContext;
use crate::db;
use crate::domain::Deck;
use crate::error::ServiceResult;
use crate::services::decks;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDeckRequest {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
}

/// GET /api/decks
pub async fn list_decks(
  auth: AuthContext,
  State(state): State<AppState>,
) -> ServiceResult<Json<Vec<Deck>>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(decks::list_decks(&conn, &auth.user_id)?))
}

/// POST /api/decks
pub async fn create_deck(
  auth: AuthContext,
  State(state): State<AppState>,
  payload: Result<Json<CreateDeckRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<Deck>)> {
  let request = json_body(payload)?;
  let conn = db::try_lock(&state.db)?;
  let deck = decks::create_deck(
    &conn,
    &auth.user_id,
    &request.name,
    request.description.as_deref(),
    Utc::now(),
  )?;
  Ok((StatusCode::CREATED, Json(deck)))
}

/// GET /api/decks/{id}
pub async fn get_deck(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> ServiceResult<Json<Deck>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(decks::get_deck(&conn, &auth.user_id, deck_id)?))
}

/// DELETE /api/decks/{id}
pub async fn delete_deck(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> ServiceResult<StatusCode> {
  let mut conn = db::try_lock(&state.db)?;
  decks::delete_deck(&mut conn, &auth.user_id, deck_id)?;
  Ok(StatusCode::NO_CONTENT)
}
