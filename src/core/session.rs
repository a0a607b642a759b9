// LogSift - GPL-3.0-or-later
// This file is part of LogSift.
//
// Copyright (C) 2026 LogSift contributors
//
// LogSift is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogSift is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogSift.  If not, see <https://www.gnu.org/licenses/>.

//! One batch analysis run over an immutable snapshot of raw lines.
//!
//! Every derived structure is recomputed wholesale per run; nothing is
//! patched incrementally. A stage failure aborts only that stage: per-line
//! failures never abort the batch, an empty record set skips the timeline,
//! and a model fit failure leaves the z-score results intact.

use crate::anomaly::iforest::{IsolationForestDetector, ModelFitError, DEFAULT_CONTAMINATION};
use crate::anomaly::reconcile::{reconcile, CombinedFlag};
use crate::anomaly::zscore::{ZScoreDetector, DEFAULT_THRESHOLD};
use crate::anomaly::AnomalyFlag;
use crate::core::bucket::{aggregate, AggregateError, TimeBucket, DEFAULT_BUCKET_WIDTH};
use crate::core::collector::{collect, Collection, Summary};
use crate::parser::line::{LogRecord, ParseFailure, RawLine};
use serde::{Deserialize, Serialize};

/// Per-run knobs. Serializable so a run can be reproduced from a saved blob;
/// the isolation forest seed lives here, never in process-global state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub bucket_width: u32,
    pub z_threshold: f64,
    pub contamination: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            bucket_width: DEFAULT_BUCKET_WIDTH,
            z_threshold: DEFAULT_THRESHOLD,
            contamination: DEFAULT_CONTAMINATION,
            seed: None,
        }
    }
}

/// Everything one run produced, including partial results from stages that
/// completed before a later stage failed.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub records: Vec<LogRecord>,
    pub failures: Vec<ParseFailure>,
    pub summary: Summary,
    /// Empty when aggregation failed on an empty record set: no timeline.
    pub buckets: Vec<TimeBucket>,
    pub zscore_flags: Vec<AnomalyFlag>,
    pub model_flags: Vec<AnomalyFlag>,
    /// Set when the isolation forest could not be fit; the z-score path and
    /// everything before it still completed.
    pub model_error: Option<ModelFitError>,
    pub combined: Vec<CombinedFlag>,
}

/// Run the full pipeline: collect, aggregate, detect twice, reconcile.
pub fn analyze(lines: &[RawLine], options: &AnalysisOptions) -> AnalysisReport {
    let collection = collect(lines);
    let summary = collection.summary();
    let Collection { records, failures } = collection;

    let buckets = match aggregate(&records, options.bucket_width) {
        Ok(buckets) => buckets,
        Err(error @ (AggregateError::EmptyInput | AggregateError::ZeroWidth)) => {
            log::warn!("skipping timeline and anomaly detection: {error}");
            return AnalysisReport {
                records,
                failures,
                summary,
                buckets: Vec::new(),
                zscore_flags: Vec::new(),
                model_flags: Vec::new(),
                model_error: None,
                combined: Vec::new(),
            };
        }
    };
    log::info!(
        "aggregated {} records into {} buckets of {}s",
        records.len(),
        buckets.len(),
        options.bucket_width
    );

    let zscore_flags = ZScoreDetector::new(options.z_threshold).detect(&buckets);

    let detector = IsolationForestDetector {
        contamination: options.contamination,
        seed: options.seed,
        ..IsolationForestDetector::default()
    };
    let (model_flags, model_error) = match detector.detect(&buckets, &records) {
        Ok(flags) => (flags, None),
        Err(error) => {
            log::warn!("isolation forest skipped: {error}");
            (Vec::new(), Some(error))
        }
    };

    let combined = reconcile(&zscore_flags, &model_flags);
    log::info!(
        "{} z-score and {} model flags reconciled into {} anomalies",
        zscore_flags.iter().filter(|flag| flag.is_anomalous).count(),
        model_flags.iter().filter(|flag| flag.is_anomalous).count(),
        combined.len()
    );

    AnalysisReport {
        records,
        failures,
        summary,
        buckets,
        zscore_flags,
        model_flags,
        model_error,
        combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_options() -> AnalysisOptions {
        AnalysisOptions {
            seed: Some(42),
            ..AnalysisOptions::default()
        }
    }

    fn lines(texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RawLine::new(*text, i + 1))
            .collect()
    }

    #[test]
    fn test_empty_input_reports_without_timeline() {
        let report = analyze(&[], &seeded_options());
        assert!(report.records.is_empty());
        assert!(report.buckets.is_empty());
        assert!(report.zscore_flags.is_empty());
        assert!(report.combined.is_empty());
        assert_eq!(report.model_error, None);
    }

    #[test]
    fn test_single_record_keeps_zscore_path_alive() {
        // One observation: the model cannot fit, but the bucket and the
        // z-score flag are still reported.
        let report = analyze(&lines(&["ts:1719835600 usr:john"]), &seeded_options());

        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].start_epoch, 1_719_835_600);
        assert_eq!(report.buckets[0].width_seconds, 10);
        assert_eq!(report.buckets[0].count, 1);
        assert_eq!(report.zscore_flags.len(), 1);
        assert!(report.model_flags.is_empty());
        assert_eq!(
            report.model_error,
            Some(ModelFitError { observations: 1 })
        );
    }

    #[test]
    fn test_failures_never_abort_the_batch() {
        let report = analyze(
            &lines(&["ts:10 usr:a", "broken line", "ts:25 usr:b"]),
            &seeded_options(),
        );
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.summary.total_lines, 3);
        assert!(!report.buckets.is_empty());
    }

    #[test]
    fn test_options_round_trip_through_serde() {
        let options = AnalysisOptions {
            bucket_width: 30,
            z_threshold: 2.5,
            contamination: 0.1,
            seed: Some(7),
        };
        let json = serde_json::to_string(&options).expect("serializes");
        let restored: AnalysisOptions = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(restored, options);
    }
}
