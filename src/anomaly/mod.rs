pub mod iforest;
pub mod reconcile;
pub mod zscore;

use serde::{Deserialize, Serialize};

/// Identity of the observation a flag refers to: a time bucket (by start
/// epoch) or a single record (by source line). Identity only, never
/// ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlagTarget {
    Bucket { start_epoch: i64 },
    Record { source_line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    ZScore,
    IsolationForest,
}

/// One detector's verdict on one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    pub target: FlagTarget,
    pub method: DetectionMethod,
    /// Deviation magnitude in the method's own scale.
    pub score: f64,
    pub is_anomalous: bool,
}
