//! Review queue assembly: which cards a session shows, in what order, and
//! how far through today's work the learner is.
//!
//! Ordering happens in two stages. A stable tie-break sort gives every
//! selection a deterministic priority, then a single shuffle from an injected
//! source decides what the learner actually sees.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::{MAX_LEVEL, MISTAKE_LEVEL};
use crate::db::CardFilter;
use crate::domain::{Card, Material, ReviewMode};

/// A calendar day `[start, end)` in the learner's offset, expressed in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl DayWindow {
  /// The day containing `now` as seen from `offset`.
  pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> Self {
    let local = now.with_timezone(&offset);
    let since_midnight = local.time().signed_duration_since(NaiveTime::MIN);
    let start = now - since_midnight;
    Self {
      start,
      end: start + Duration::days(1),
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start <= at && at < self.end
  }
}

/// Source of presentation order.
pub trait Shuffler {
  fn shuffle<T>(&mut self, items: &mut [T]);
}

/// Shuffles with any `rand` generator.
pub struct RngShuffler<R: Rng>(pub R);

impl<R: Rng> Shuffler for RngShuffler<R> {
  fn shuffle<T>(&mut self, items: &mut [T]) {
    items.shuffle(&mut self.0);
  }
}

/// Leaves the tie-break order in place.
pub struct KeepOrder;

impl Shuffler for KeepOrder {
  fn shuffle<T>(&mut self, _items: &mut [T]) {}
}

/// Cards a session in `mode` draws from.
pub fn selection_filter(
  owner_id: &str,
  deck_id: i64,
  mode: ReviewMode,
  today: DayWindow,
) -> CardFilter {
  let base = CardFilter::owned_by(owner_id).in_deck(deck_id);
  match mode {
    ReviewMode::Mistakes => base.with_level(MISTAKE_LEVEL),
    ReviewMode::All => base
      .next_review_within(today.start, today.end)
      .level_below(MAX_LEVEL),
  }
}

/// Stable tie-break: most-reviewed mistakes first, weakest due cards first.
pub fn prioritize(cards: &mut [Card], mode: ReviewMode) {
  match mode {
    ReviewMode::Mistakes => cards.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
    ReviewMode::All => cards.sort_by_key(|card| card.level),
  }
}

/// Tie-break, then shuffle once for presentation.
pub fn order_session<S: Shuffler>(
  mut cards: Vec<Card>,
  mode: ReviewMode,
  shuffler: &mut S,
) -> Vec<Card> {
  prioritize(&mut cards, mode);
  shuffler.shuffle(&mut cards);
  cards
}

/// A card as handed to the learner, with its source text attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
  pub id: i64,
  pub front: String,
  pub back: String,
  pub level: i64,
  pub review_count: i64,
  pub correct_count: i64,
  pub incorrect_count: i64,
  pub material_content: Option<String>,
}

/// Join cards against their materials. A missing material yields no
/// attachment rather than an error.
pub fn attach_materials(cards: Vec<Card>, materials: &[Material]) -> Vec<ReviewCard> {
  let contents: HashMap<i64, &str> = materials
    .iter()
    .map(|m| (m.id, m.content.as_str()))
    .collect();

  cards
    .into_iter()
    .map(|card| {
      let material_content = card
        .material_id
        .and_then(|id| contents.get(&id))
        .map(|content| content.to_string());
      ReviewCard {
        id: card.id,
        front: card.front,
        back: card.back,
        level: card.level,
        review_count: card.review_count,
        correct_count: card.correct_count,
        incorrect_count: card.incorrect_count,
        material_content,
      }
    })
    .collect()
}

/// Distinct material ids referenced by `cards`, in first-seen order.
pub fn material_ids(cards: &[Card]) -> Vec<i64> {
  let mut ids: Vec<i64> = Vec::new();
  for id in cards.iter().filter_map(|c| c.material_id) {
    if !ids.contains(&id) {
      ids.push(id);
    }
  }
  ids
}

/// Today's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
  pub remembered_today: i64,
  pub total_for_today: i64,
}

impl SessionProgress {
  /// The total is outstanding plus remembered, so answering a card correctly
  /// moves it between the two without shrinking the total.
  pub fn from_counts(outstanding: i64, remembered_today: i64) -> Self {
    Self {
      remembered_today,
      total_for_today: outstanding + remembered_today,
    }
  }

  pub fn is_complete(&self) -> bool {
    self.remembered_today == self.total_for_today
  }
}

/// Filters whose counts make up [`SessionProgress`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressFilters {
  /// Scheduled at or before now.
  pub due: CardFilter,
  /// Reviewed today with a correct last answer.
  pub remembered: CardFilter,
  /// Both of the above; subtracted so no card counts twice.
  pub due_and_remembered: CardFilter,
}

pub fn progress_filters(
  owner_id: &str,
  deck_id: i64,
  now: DateTime<Utc>,
  today: DayWindow,
) -> ProgressFilters {
  let base = CardFilter::owned_by(owner_id).in_deck(deck_id);
  let remembered = base
    .clone()
    .reviewed_within(today.start, today.end)
    .level_at_least(MISTAKE_LEVEL + 1);
  ProgressFilters {
    due: base.due_by(now),
    due_and_remembered: remembered.clone().due_by(now),
    remembered,
  }
}

impl ProgressFilters {
  /// In-memory evaluation over a deck's cards.
  pub fn evaluate(&self, cards: &[Card]) -> SessionProgress {
    let count = |filter: &CardFilter| cards.iter().filter(|c| filter.matches(c)).count() as i64;
    let outstanding = count(&self.due) - count(&self.due_and_remembered);
    SessionProgress::from_counts(outstanding, count(&self.remembered))
  }
}
