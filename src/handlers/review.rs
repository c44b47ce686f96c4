use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::auth::AuthContext;
use crate::db;
use crate::domain::{Card, CardSummary};
use crate::error::ServiceResult;
use crate::services::review::{self, DueQueue};
use crate::srs::RngShuffler;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
  pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
  pub is_correct: bool,
  /// The card's review count as the client last saw it
  #[serde(default)]
  pub expected_review_count: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
  pub modified_count: usize,
}

/// GET /api/decks/{id}/review?mode=all|mistakes
pub async fn get_review_queue(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
  Query(query): Query<ReviewQuery>,
) -> ServiceResult<Json<DueQueue>> {
  let mode = review::parse_mode(query.mode.as_deref())?;
  let conn = db::try_lock(&state.db)?;
  let queue = review::get_due_queue(
    &conn,
    &auth.user_id,
    deck_id,
    mode,
    Utc::now(),
    state.day_offset,
    &mut RngShuffler(rand::rng()),
  )?;
  Ok(Json(queue))
}

/// GET /api/cards/review
pub async fn list_due_cards(
  auth: AuthContext,
  State(state): State<AppState>,
) -> ServiceResult<Json<Vec<Card>>> {
  let conn = db::try_lock(&state.db)?;
  Ok(Json(review::list_due_cards(&conn, &auth.user_id, Utc::now())?))
}

/// POST /api/decks/{id}/reset-levels
pub async fn reset_levels(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(deck_id): Path<i64>,
) -> ServiceResult<Json<ResetResponse>> {
  let conn = db::try_lock(&state.db)?;
  let modified_count = review::reset_deck_proficiency(&conn, &auth.user_id, deck_id, Utc::now())?;
  Ok(Json(ResetResponse { modified_count }))
}

/// POST /api/cards/{id}/review
pub async fn submit_review(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(card_id): Path<i64>,
  payload: Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> ServiceResult<Json<CardSummary>> {
  let request = json_body(payload)?;
  let mut conn = db::try_lock(&state.db)?;
  let summary = review::submit_review(
    &mut conn,
    &auth.user_id,
    card_id,
    request.is_correct,
    request.expected_review_count,
    Utc::now(),
  )?;
  Ok(Json(summary))
}
