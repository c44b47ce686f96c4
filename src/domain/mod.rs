pub mod card;
pub mod deck;
pub mod review;

pub use card::{Card, CardSummary, NewCard};
pub use deck::{Deck, Material};
pub use review::{ReviewLog, ReviewMode};
