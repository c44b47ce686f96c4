use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which pool a review session draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
  /// Cards scheduled for today that are not yet mastered.
  #[default]
  All,
  /// Cards sitting at level 0.
  Mistakes,
}

impl ReviewMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Mistakes => "mistakes",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "all" => Some(Self::All),
      "mistakes" => Some(Self::Mistakes),
      _ => None,
    }
  }
}

/// One applied review outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: i64,
  pub owner_id: String,
  pub is_correct: bool,
  pub level_after: i64,
  pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
  pub fn new(
    card_id: i64,
    owner_id: String,
    is_correct: bool,
    level_after: i64,
    reviewed_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id: 0,
      card_id,
      owner_id,
      is_correct,
      level_after,
      reviewed_at,
    }
  }
}
