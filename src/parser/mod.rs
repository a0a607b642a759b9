pub mod extract;
pub mod line;

pub use extract::extract;
pub use line::{FailureReason, LogRecord, ParseFailure, RawLine};
