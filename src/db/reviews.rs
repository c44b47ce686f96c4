//! Review history

use rusqlite::{params, Connection, Result};

use super::{column_ts, fmt_ts};
use crate::domain::ReviewLog;

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (card_id, owner_id, is_correct, level_after, reviewed_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![
            log.card_id,
            log.owner_id,
            if log.is_correct { 1 } else { 0 },
            log.level_after,
            fmt_ts(log.reviewed_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Review history of one card, oldest first.
pub fn get_review_logs(conn: &Connection, card_id: i64, owner_id: &str) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, card_id, owner_id, is_correct, level_after, reviewed_at
    FROM review_logs
    WHERE card_id = ?1 AND owner_id = ?2
    ORDER BY id ASC
    "#,
    )?;

    let logs = stmt
        .query_map(params![card_id, owner_id], |row| {
            Ok(ReviewLog {
                id: row.get(0)?,
                card_id: row.get(1)?,
                owner_id: row.get(2)?,
                is_correct: row.get::<_, i64>(3)? != 0,
                level_after: row.get(4)?,
                reviewed_at: column_ts(row, 5)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(logs)
}
