use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MAX_LEVEL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
  pub id: i64,
  /// Opaque id of the owning user. Every query is scoped by it.
  pub owner_id: String,
  pub deck_id: i64,
  /// Source material this card was made from, if any.
  pub material_id: Option<i64>,
  pub front: String,
  pub back: String,

  // Proficiency: 0 = wrong or never passed, MAX_LEVEL = mastered
  pub level: i64,
  pub review_count: i64,
  pub correct_count: i64,
  pub incorrect_count: i64,
  /// `None` once the card is mastered and no longer scheduled.
  pub next_review: Option<DateTime<Utc>>,
  pub last_reviewed_at: Option<DateTime<Utc>>,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Card {
  /// A fresh card: level 0, no reviews, due immediately.
  pub fn new(
    owner_id: String,
    deck_id: i64,
    front: String,
    back: String,
    material_id: Option<i64>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: 0,
      owner_id,
      deck_id,
      material_id,
      front,
      back,
      level: 0,
      review_count: 0,
      correct_count: 0,
      incorrect_count: 0,
      next_review: Some(now),
      last_reviewed_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_mastered(&self) -> bool {
    self.level >= MAX_LEVEL
  }

  /// True when the card is scheduled at or before `at`.
  pub fn is_due_at(&self, at: DateTime<Utc>) -> bool {
    self.next_review.is_some_and(|next| next <= at)
  }

  pub fn summary(&self) -> CardSummary {
    CardSummary {
      id: self.id,
      level: self.level,
      review_count: self.review_count,
      correct_count: self.correct_count,
      incorrect_count: self.incorrect_count,
      next_review: self.next_review,
    }
  }
}

/// Scheduling state returned after a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
  pub id: i64,
  pub level: i64,
  pub review_count: i64,
  pub correct_count: i64,
  pub incorrect_count: i64,
  pub next_review: Option<DateTime<Utc>>,
}

/// Text for a card about to be inserted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
  pub front: String,
  pub back: String,
  #[serde(default)]
  pub material_id: Option<i64>,
}
