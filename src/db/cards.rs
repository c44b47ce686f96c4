//! Card CRUD and query operations

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Result, Row};

use super::filter::CardFilter;
use super::{column_opt_ts, column_ts, fmt_ts};
use crate::domain::Card;

const CARD_COLUMNS: &str = "id, owner_id, deck_id, material_id, front, back, level, review_count, \
     correct_count, incorrect_count, next_review, last_reviewed_at, created_at, updated_at";

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO cards (owner_id, deck_id, material_id, front, back, level, review_count,
                       correct_count, incorrect_count, next_review, last_reviewed_at,
                       created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
        params![
            card.owner_id,
            card.deck_id,
            card.material_id,
            card.front,
            card.back,
            card.level,
            card.review_count,
            card.correct_count,
            card.incorrect_count,
            card.next_review.map(fmt_ts),
            card.last_reviewed_at.map(fmt_ts),
            fmt_ts(card.created_at),
            fmt_ts(card.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a batch of cards into one deck and bump its card_count, all or
/// nothing. Returns the new ids in input order.
pub fn insert_cards(
    conn: &mut Connection,
    deck_id: i64,
    owner_id: &str,
    cards: &[Card],
    now: DateTime<Utc>,
) -> Result<Vec<i64>> {
    let tx = conn.transaction()?;
    let mut ids = Vec::with_capacity(cards.len());
    for card in cards {
        ids.push(insert_card(&tx, card)?);
    }
    super::adjust_card_count(&tx, deck_id, owner_id, ids.len() as i64, now)?;
    tx.commit()?;
    Ok(ids)
}

/// Fetch a card, scoped to its owner.
pub fn get_card(conn: &Connection, id: i64, owner_id: &str) -> Result<Option<Card>> {
    let query = format!("SELECT {} FROM cards WHERE id = ?1 AND owner_id = ?2", CARD_COLUMNS);
    let mut stmt = conn.prepare(&query)?;

    let mut rows = stmt.query(params![id, owner_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

/// All cards matching `filter`, oldest first.
pub fn find_cards(conn: &Connection, filter: &CardFilter) -> Result<Vec<Card>> {
    query_cards(conn, filter, "id ASC")
}

/// All cards matching `filter`, soonest due first. Unscheduled cards sort
/// before scheduled ones.
pub fn find_cards_by_next_review(conn: &Connection, filter: &CardFilter) -> Result<Vec<Card>> {
    query_cards(conn, filter, "next_review ASC, id ASC")
}

fn query_cards(conn: &Connection, filter: &CardFilter, order_by: &str) -> Result<Vec<Card>> {
    let (clause, values) = filter.to_sql();
    let query = format!(
        "SELECT {} FROM cards WHERE {} ORDER BY {}",
        CARD_COLUMNS, clause, order_by
    );
    let mut stmt = conn.prepare(&query)?;

    let cards = stmt
        .query_map(params_from_iter(values.iter()), |row| row_to_card(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

pub fn count_cards(conn: &Connection, filter: &CardFilter) -> Result<i64> {
    let (clause, values) = filter.to_sql();
    let query = format!("SELECT COUNT(*) FROM cards WHERE {}", clause);
    conn.query_row(&query, params_from_iter(values.iter()), |row| row.get(0))
}

/// Write a reviewed card back, but only if nobody else reviewed it since
/// `expected_review_count` was read. Returns false when the swap lost.
pub fn update_card_after_review(
    conn: &Connection,
    card: &Card,
    expected_review_count: i64,
) -> Result<bool> {
    let updated = conn.execute(
        r#"
    UPDATE cards
    SET level = ?1, review_count = ?2, correct_count = ?3, incorrect_count = ?4,
        next_review = ?5, last_reviewed_at = ?6, updated_at = ?7
    WHERE id = ?8 AND owner_id = ?9 AND review_count = ?10
    "#,
        params![
            card.level,
            card.review_count,
            card.correct_count,
            card.incorrect_count,
            card.next_review.map(fmt_ts),
            card.last_reviewed_at.map(fmt_ts),
            fmt_ts(card.updated_at),
            card.id,
            card.owner_id,
            expected_review_count,
        ],
    )?;
    Ok(updated == 1)
}

/// Put every card of a deck back to level 0, due now.
pub fn reset_deck_levels(
    conn: &Connection,
    deck_id: i64,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let now = fmt_ts(now);
    conn.execute(
        r#"
    UPDATE cards
    SET level = 0, next_review = ?1, updated_at = ?1
    WHERE deck_id = ?2 AND owner_id = ?3
    "#,
        params![now, deck_id, owner_id],
    )
}

/// Replace a card's text. Scheduling state is untouched.
pub fn update_card_text(
    conn: &Connection,
    id: i64,
    owner_id: &str,
    front: &str,
    back: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE cards SET front = ?1, back = ?2, updated_at = ?3 WHERE id = ?4 AND owner_id = ?5",
        params![front, back, fmt_ts(now), id, owner_id],
    )?;
    Ok(updated == 1)
}

/// Delete the listed cards of one deck, with their review history.
pub fn delete_cards(conn: &Connection, deck_id: i64, owner_id: &str, ids: &[i64]) -> Result<usize> {
    let mut deleted = 0;
    for id in ids {
        conn.execute(
            r#"
      DELETE FROM review_logs
      WHERE card_id IN (SELECT id FROM cards WHERE id = ?1 AND deck_id = ?2 AND owner_id = ?3)
      "#,
            params![id, deck_id, owner_id],
        )?;
        deleted += conn.execute(
            "DELETE FROM cards WHERE id = ?1 AND deck_id = ?2 AND owner_id = ?3",
            params![id, deck_id, owner_id],
        )?;
    }
    Ok(deleted)
}

/// Delete every card of a deck, with their review history.
pub fn delete_deck_cards(conn: &Connection, deck_id: i64, owner_id: &str) -> Result<usize> {
    conn.execute(
        r#"
    DELETE FROM review_logs
    WHERE card_id IN (SELECT id FROM cards WHERE deck_id = ?1 AND owner_id = ?2)
    "#,
        params![deck_id, owner_id],
    )?;
    conn.execute(
        "DELETE FROM cards WHERE deck_id = ?1 AND owner_id = ?2",
        params![deck_id, owner_id],
    )
}

fn row_to_card(row: &Row) -> Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        deck_id: row.get(2)?,
        material_id: row.get(3)?,
        front: row.get(4)?,
        back: row.get(5)?,
        level: row.get(6)?,
        review_count: row.get(7)?,
        correct_count: row.get(8)?,
        incorrect_count: row.get(9)?,
        next_review: column_opt_ts(row, 10)?,
        last_reviewed_at: column_opt_ts(row, 11)?,
        created_at: column_ts(row, 12)?,
        updated_at: column_ts(row, 13)?,
    })
}
