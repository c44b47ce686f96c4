pub mod proficiency;
pub mod queue;

pub use proficiency::{apply_outcome, delay_days, ProficiencyError};
pub use queue::{
  attach_materials, order_session, prioritize, progress_filters, selection_filter, DayWindow,
  KeepOrder, ReviewCard, RngShuffler, SessionProgress, Shuffler,
};
