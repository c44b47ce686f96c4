//! Card predicates that run both as SQL and in memory.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use super::fmt_ts;
use crate::domain::Card;

/// Conjunction of optional constraints, always scoped to one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFilter {
    pub owner_id: String,
    pub deck_id: Option<i64>,
    pub level: Option<i64>,
    /// Exclusive upper bound on level.
    pub level_below: Option<i64>,
    pub level_at_least: Option<i64>,
    /// `[from, until)` on next_review. Unscheduled cards never match.
    pub next_review_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// next_review at or before this instant.
    pub due_by: Option<DateTime<Utc>>,
    /// `[from, until)` on last_reviewed_at.
    pub reviewed_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl CardFilter {
    pub fn owned_by(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            ..Self::default()
        }
    }

    pub fn in_deck(mut self, deck_id: i64) -> Self {
        self.deck_id = Some(deck_id);
        self
    }

    pub fn with_level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn level_below(mut self, bound: i64) -> Self {
        self.level_below = Some(bound);
        self
    }

    pub fn level_at_least(mut self, bound: i64) -> Self {
        self.level_at_least = Some(bound);
        self
    }

    pub fn next_review_within(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.next_review_within = Some((from, until));
        self
    }

    pub fn due_by(mut self, at: DateTime<Utc>) -> Self {
        self.due_by = Some(at);
        self
    }

    pub fn reviewed_within(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.reviewed_within = Some((from, until));
        self
    }

    /// In-memory evaluation; agrees with [`CardFilter::to_sql`].
    pub fn matches(&self, card: &Card) -> bool {
        let in_range = |ts: Option<DateTime<Utc>>, (from, until): (DateTime<Utc>, DateTime<Utc>)| {
            ts.is_some_and(|t| from <= t && t < until)
        };

        card.owner_id == self.owner_id
            && self.deck_id.is_none_or(|id| card.deck_id == id)
            && self.level.is_none_or(|level| card.level == level)
            && self.level_below.is_none_or(|bound| card.level < bound)
            && self.level_at_least.is_none_or(|bound| card.level >= bound)
            && self
                .next_review_within
                .is_none_or(|range| in_range(card.next_review, range))
            && self.due_by.is_none_or(|at| card.is_due_at(at))
            && self
                .reviewed_within
                .is_none_or(|range| in_range(card.last_reviewed_at, range))
    }

    /// WHERE clause body and its positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&'static str> = vec!["owner_id = ?"];
        let mut params: Vec<Value> = vec![Value::Text(self.owner_id.clone())];

        if let Some(id) = self.deck_id {
            clauses.push("deck_id = ?");
            params.push(Value::Integer(id));
        }
        if let Some(level) = self.level {
            clauses.push("level = ?");
            params.push(Value::Integer(level));
        }
        if let Some(bound) = self.level_below {
            clauses.push("level < ?");
            params.push(Value::Integer(bound));
        }
        if let Some(bound) = self.level_at_least {
            clauses.push("level >= ?");
            params.push(Value::Integer(bound));
        }
        // NULL comparisons are never true, so unscheduled cards drop out
        if let Some((from, until)) = self.next_review_within {
            clauses.push("next_review >= ? AND next_review < ?");
            params.push(Value::Text(fmt_ts(from)));
            params.push(Value::Text(fmt_ts(until)));
        }
        if let Some(at) = self.due_by {
            clauses.push("next_review <= ?");
            params.push(Value::Text(fmt_ts(at)));
        }
        if let Some((from, until)) = self.reviewed_within {
            clauses.push("last_reviewed_at >= ? AND last_reviewed_at < ?");
            params.push(Value::Text(fmt_ts(from)));
            params.push(Value::Text(fmt_ts(until)));
        }

        (clauses.join(" AND "), params)
    }
}
