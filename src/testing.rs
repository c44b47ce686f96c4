//! Test utilities for database setup.
//!
//! Reuses the authoritative schema so tests never carry their own DDL.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use crate::db;
use crate::domain::{Card, Deck};

/// A migrated database file in a temporary directory.
///
/// The directory is removed when the environment is dropped.
pub struct TestEnv {
    /// Kept alive for the database file
    pub temp: TempDir,
    pub conn: Connection,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let conn = Connection::open(temp.path().join("deckwise.db"))?;
        db::run_migrations(&conn)?;

        Ok(Self { temp, conn })
    }

    /// Insert an empty deck and return it with its id.
    pub fn seed_deck(&self, owner_id: &str, name: &str, now: DateTime<Utc>) -> Deck {
        let mut deck = Deck {
            id: 0,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            card_count: 0,
            created_at: now,
            updated_at: now,
        };
        deck.id = db::insert_deck(&self.conn, &deck).unwrap();
        deck
    }

    /// Insert a card at the given level and schedule. Does not touch the
    /// deck's card_count.
    pub fn seed_card(
        &self,
        owner_id: &str,
        deck_id: i64,
        level: i64,
        next_review: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Card {
        let mut card = Card::new(
            owner_id.to_string(),
            deck_id,
            format!("front {}", level),
            format!("back {}", level),
            None,
            now,
        );
        card.level = level;
        card.next_review = next_review;
        card.id = db::insert_card(&self.conn, &card).unwrap();
        card
    }
}
