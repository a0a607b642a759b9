//! LogSift core: tolerant extraction of structured records from
//! loosely formatted forensic log text, plus two-method anomaly detection
//! (z-score and isolation forest) over time-bucketed activity counts.
//!
//! The pipeline is single-threaded, batch and synchronous: one immutable
//! snapshot of raw lines in, one [`AnalysisReport`] out. Rendering, export
//! targets and geolocation are collaborators that consume the report.

pub mod anomaly;
pub mod core;
pub mod geo;
pub mod parser;

pub use crate::core::session::{analyze, AnalysisOptions, AnalysisReport};
pub use crate::parser::line::{LogRecord, ParseFailure, RawLine};
