use axum::{
  routing::{get, post, put},
  Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    // Decks
    .route("/api/decks", get(handlers::list_decks).post(handlers::create_deck))
    .route(
      "/api/decks/{id}",
      get(handlers::get_deck).delete(handlers::delete_deck),
    )
    .route(
      "/api/decks/{id}/cards",
      get(handlers::list_cards)
        .post(handlers::add_cards)
        .delete(handlers::delete_cards),
    )
    // Review sessions
    .route("/api/decks/{id}/review", get(handlers::get_review_queue))
    .route("/api/decks/{id}/reset-levels", post(handlers::reset_levels))
    .route("/api/cards/review", get(handlers::list_due_cards))
    .route(
      "/api/cards/{id}",
      put(handlers::update_card).delete(handlers::delete_card),
    )
    .route("/api/cards/{id}/review", post(handlers::submit_review))
    // Materials
    .route(
      "/api/materials",
      get(handlers::list_materials)
        .post(handlers::create_material)
        .delete(handlers::delete_materials),
    )
    .route("/api/materials/tags", get(handlers::list_material_tags))
    .route(
      "/api/materials/{id}",
      put(handlers::update_material).delete(handlers::delete_material),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
