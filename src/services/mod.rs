//! Application services.
//!
//! Validation, ownership checks and transactions live here; handlers stay
//! thin and the scheduling rules in `srs` stay pure.

pub mod decks;
pub mod materials;
pub mod review;
