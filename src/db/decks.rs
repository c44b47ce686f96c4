//! Deck storage

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result, Row};

use super::{column_ts, fmt_ts};
use crate::domain::Deck;

const DECK_COLUMNS: &str = "id, owner_id, name, description, card_count, created_at, updated_at";

pub fn insert_deck(conn: &Connection, deck: &Deck) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO decks (owner_id, name, description, card_count, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
        params![
            deck.owner_id,
            deck.name,
            deck.description,
            deck.card_count,
            fmt_ts(deck.created_at),
            fmt_ts(deck.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_deck(conn: &Connection, id: i64, owner_id: &str) -> Result<Option<Deck>> {
    let query = format!("SELECT {} FROM decks WHERE id = ?1 AND owner_id = ?2", DECK_COLUMNS);
    let mut stmt = conn.prepare(&query)?;

    let mut rows = stmt.query(params![id, owner_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_deck(row)?))
    } else {
        Ok(None)
    }
}

/// A user's decks, newest first.
pub fn list_decks(conn: &Connection, owner_id: &str) -> Result<Vec<Deck>> {
    let query = format!(
        "SELECT {} FROM decks WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
        DECK_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;

    let decks = stmt
        .query_map(params![owner_id], |row| row_to_deck(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(decks)
}

/// Shift the stored card count by `delta`, never below zero.
pub fn adjust_card_count(
    conn: &Connection,
    id: i64,
    owner_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        r#"
    UPDATE decks
    SET card_count = MAX(card_count + ?1, 0), updated_at = ?2
    WHERE id = ?3 AND owner_id = ?4
    "#,
        params![delta, fmt_ts(now), id, owner_id],
    )?;
    Ok(())
}

/// Remove the deck row only. Callers delete its cards first.
pub fn delete_deck(conn: &Connection, id: i64, owner_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM decks WHERE id = ?1 AND owner_id = ?2",
        params![id, owner_id],
    )?;
    Ok(deleted == 1)
}

fn row_to_deck(row: &Row) -> Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        card_count: row.get(4)?,
        created_at: column_ts(row, 5)?,
        updated_at: column_ts(row, 6)?,
    })
}
