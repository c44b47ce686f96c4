//! Application state shared by all handlers.

use chrono::FixedOffset;

use crate::config::AppConfig;
use crate::db::DbPool;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,

    /// Offset that decides where the learner's day starts
    pub day_offset: FixedOffset,
}

impl AppState {
    pub fn new(db: DbPool, config: &AppConfig) -> Self {
        Self {
            db,
            day_offset: config.day_offset,
        }
    }
}
