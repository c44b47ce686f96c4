use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named group of cards belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
  pub id: i64,
  pub owner_id: String,
  pub name: String,
  pub description: String,
  /// Maintained by card insert/delete, never recomputed.
  pub card_count: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Source text that cards may point back to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
  pub id: i64,
  pub owner_id: String,
  pub content: String,
  pub tag: Option<String>,
  pub created_at: DateTime<Utc>,
}
