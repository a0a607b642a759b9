use super::{AnomalyFlag, DetectionMethod, FlagTarget};
use crate::core::bucket::TimeBucket;

/// Default number of standard deviations before a bucket counts as anomalous.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Statistical detector over bucket counts.
///
/// Two-pass batch computation: population mean and standard deviation first,
/// then one flag per bucket. Recompute in full whenever the buckets change.
#[derive(Debug, Clone, Copy)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl ZScoreDetector {
    pub const fn new(threshold: f64) -> Self {
        ZScoreDetector { threshold }
    }

    /// Emit one flag per bucket. A degenerate all-equal series has zero
    /// spread and is never anomalous; the division by zero is guarded and the
    /// condition is logged, not fatal.
    pub fn detect(&self, buckets: &[TimeBucket]) -> Vec<AnomalyFlag> {
        if buckets.is_empty() {
            return Vec::new();
        }

        let n = buckets.len() as f64;
        let mean = buckets.iter().map(|b| b.count as f64).sum::<f64>() / n;
        let variance = buckets
            .iter()
            .map(|b| (b.count as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let stddev = variance.sqrt();

        let degenerate = stddev < f64::EPSILON;
        if degenerate {
            log::warn!("degenerate bucket distribution (stddev = 0), no bucket can be anomalous");
        }

        buckets
            .iter()
            .map(|bucket| {
                let score = if degenerate {
                    0.0
                } else {
                    (bucket.count as f64 - mean) / stddev
                };
                AnomalyFlag {
                    target: FlagTarget::Bucket {
                        start_epoch: bucket.start_epoch,
                    },
                    method: DetectionMethod::ZScore,
                    score,
                    is_anomalous: score.abs() > self.threshold,
                }
            })
            .collect()
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}
