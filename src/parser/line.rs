use serde::{Deserialize, Serialize};

/// A single raw input line together with its 1-based position in the source.
///
/// Owned by the collector for the duration of one parse pass and discarded
/// after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub number: usize,
}

impl RawLine {
    pub fn new(text: impl Into<String>, number: usize) -> Self {
        RawLine {
            text: text.into(),
            number,
        }
    }
}

/// One successfully parsed log entry.
///
/// Only `timestamp` is required; every other field is independently optional.
/// Absent fields are `None`, never an empty string, so that summary
/// cardinalities only count values that were actually present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Epoch seconds, non-negative.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    /// Originating line number, kept for traceability only.
    pub source_line: usize,
}

/// Why a line failed to produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    MissingTimestamp,
    MalformedTimestamp,
}

impl FailureReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureReason::MissingTimestamp => "missing timestamp",
            FailureReason::MalformedTimestamp => "malformed timestamp",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected line. Collected by the collector, never silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub source_line: usize,
    pub reason: FailureReason,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.source_line, self.reason)
    }
}
