//! Fixed exponential review ladder.
//!
//! A correct answer climbs one rung and waits `2^level - 1` days; a wrong
//! answer drops to rung 0 and is due again immediately. Rung 5 is mastery
//! and leaves the schedule.

use chrono::{DateTime, Duration, Utc};

use crate::config::{MAX_LEVEL, MISTAKE_LEVEL};
use crate::domain::Card;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProficiencyError {
  /// Stored level outside `0..=MAX_LEVEL`; indicates corrupted data.
  InvalidState { card_id: i64, level: i64 },
}

impl std::fmt::Display for ProficiencyError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::InvalidState { card_id, level } => write!(
        f,
        "card {} has level {} outside 0..={}",
        card_id, level, MAX_LEVEL
      ),
    }
  }
}

impl std::error::Error for ProficiencyError {}

/// Days to wait after reaching `level` with a correct answer.
///
/// `None` outside `0..MAX_LEVEL`; mastered cards have no delay.
pub fn delay_days(level: i64) -> Option<i64> {
  if !(0..MAX_LEVEL).contains(&level) {
    return None;
  }
  let shift = u32::try_from(level).ok()?;
  1_i64.checked_shl(shift).map(|span| span - 1)
}

/// Next review instant for a card that just reached `level` correctly.
/// `None` means mastered.
fn next_review_after_correct(level: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
  if level >= MAX_LEVEL {
    None
  } else {
    delay_days(level).map(|days| now + Duration::days(days))
  }
}

/// Apply one review outcome to a card, returning the updated card.
///
/// Pure: nothing is persisted and no clock is read.
pub fn apply_outcome(
  card: &Card,
  is_correct: bool,
  now: DateTime<Utc>,
) -> Result<Card, ProficiencyError> {
  if !(MISTAKE_LEVEL..=MAX_LEVEL).contains(&card.level) {
    return Err(ProficiencyError::InvalidState {
      card_id: card.id,
      level: card.level,
    });
  }

  let mut updated = card.clone();
  updated.review_count += 1;

  if is_correct {
    updated.correct_count += 1;
    updated.level = (card.level + 1).min(MAX_LEVEL);
    updated.next_review = next_review_after_correct(updated.level, now);
  } else {
    updated.incorrect_count += 1;
    updated.level = MISTAKE_LEVEL;
    updated.next_review = Some(now);
  }

  updated.last_reviewed_at = Some(now);
  updated.updated_at = now;
  Ok(updated)
}
