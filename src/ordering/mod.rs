pub mod counter;
pub mod history;
pub mod killers;
pub mod movepicker;

pub use movepicker::{is_quiet, score_all, OrderingTables};
