use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::auth::AuthContext;
use crate::db;
use crate::domain::{Card, NewCard};
use crate::error::ServiceResult;
use crate::services::decks;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCardsRequest {
  pub cards: Vec<NewCard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCardsRequest {
  pub card_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCardsResponse {
  pub deleted_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
  pub front: String,
  pub back: String,
}

/// GET /api/decks/{id}/cards
pub async fn list_cards(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> ServiceResult<Json<Vec<Card>>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(decks::list_cards(&conn, &auth.user_id, deck_id)?))
}

/// POST /api/decks/{id}/cards
pub async fn add_cards(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  payload: Result<Json<AddCardsRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<Vec<Card>>)> {
  let request = json_body(payload)?;
  let mut conn = db::try_lock(&state.db)?;
  let cards = decks::add_cards(&mut conn, &auth.user_id, deck_id, request.cards, Utc::now())?;
  Ok((StatusCode::CREATED, Json(cards)))
}

/// DELETE /api/decks/{id}/cards
pub async fn delete_cards(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  payload: Result<Json<DeleteCardsRequest>, JsonRejection>,
) -> ServiceResult<Json<DeleteCardsResponse>> {
  let request = json_body(payload)?;
  let mut conn = db::try_lock(&state.db)?;
  let deleted_count =
    decks::delete_cards(&mut conn, &auth.user_id, deck_id, &request.card_ids, Utc::now())?;
  Ok(Json(DeleteCardsResponse { deleted_count }))
}

/// PUT /api/cards/{id}
pub async fn update_card(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
  payload: Result<Json<UpdateCardRequest>, JsonRejection>,
) -> ServiceResult<Json<Card>> {
  let request = json_body(payload)?;
  let conn = db::try_lock(&state.db)?;
  let card = decks::update_card_text(
    &conn,
    &auth.user_id,
    card_id,
    &request.front,
    &request.back,
    Utc::now(),
  )?;
  Ok(Json(card))
}

/// DELETE /api/cards/{id}
pub async fn delete_card(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
) -> ServiceResult<StatusCode> {
  let mut conn = db::try_lock(&state.db)?;
  decks::delete_card(&mut conn, &auth.user_id, card_id, Utc::now())?;
  Ok(StatusCode::NO_CONTENT)
}
