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

//! Fixed-width time bucket derivation.

use crate::parser::line::LogRecord;
use serde::Serialize;
use thiserror::Error;

/// Default bucket width in seconds.
pub const DEFAULT_BUCKET_WIDTH: u32 = 10;

/// A fixed-width time window over `[start_epoch, start_epoch + width_seconds)`.
///
/// Buckets are derived wholesale from the record set and never mutated in
/// place; re-aggregate after any change to the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeBucket {
    pub start_epoch: i64,
    pub width_seconds: u32,
    pub count: usize,
    /// Indices into the record slice this bucket was derived from.
    pub records: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("no records to aggregate, nothing to bucket")]
    EmptyInput,
    #[error("bucket width must be non-zero")]
    ZeroWidth,
}

/// Group records into contiguous fixed-width buckets.
///
/// Boundaries are anchored at `floor(min_timestamp / width) * width` and the
/// sequence runs gap-free from the minimum to the maximum observed timestamp.
/// Empty buckets are included: gaps are meaningful for the timeline and for
/// the statistical baseline.
pub fn aggregate(
    records: &[LogRecord],
    width_seconds: u32,
) -> Result<Vec<TimeBucket>, AggregateError> {
    if width_seconds == 0 {
        return Err(AggregateError::ZeroWidth);
    }
    let min = records
        .iter()
        .map(|record| record.timestamp)
        .min()
        .ok_or(AggregateError::EmptyInput)?;
    let max = records
        .iter()
        .map(|record| record.timestamp)
        .max()
        .ok_or(AggregateError::EmptyInput)?;

    let width = i64::from(width_seconds);
    let anchor = (min / width) * width;
    let bucket_count = ((max - anchor) / width + 1) as usize;

    let mut buckets: Vec<TimeBucket> = (0..bucket_count)
        .map(|slot| TimeBucket {
            start_epoch: anchor + slot as i64 * width,
            width_seconds,
            count: 0,
            records: Vec::new(),
        })
        .collect();

    for (index, record) in records.iter().enumerate() {
        let slot = ((record.timestamp - anchor) / width) as usize;
        buckets[slot].count += 1;
        buckets[slot].records.push(index);
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: i64, source_line: usize) -> LogRecord {
        LogRecord {
            timestamp,
            event_type: None,
            username: None,
            ip_address: None,
            file_path: None,
            process_id: None,
            source_line,
        }
    }

    #[test]
    fn test_single_record_single_bucket() {
        let records = vec![record(1_719_835_603, 1)];
        let buckets = aggregate(&records, 10).expect("non-empty input");

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].start_epoch, 1_719_835_600);
        assert_eq!(buckets[0].width_seconds, 10);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].records, vec![0]);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(aggregate(&[], 10), Err(AggregateError::EmptyInput));
    }

    #[test]
    fn test_zero_width_is_an_error() {
        let records = vec![record(100, 1)];
        assert_eq!(aggregate(&records, 0), Err(AggregateError::ZeroWidth));
    }

    #[test]
    fn test_gap_buckets_are_included() {
        // Records 50 seconds apart: the buckets between them must exist with
        // count 0, not be skipped.
        let records = vec![record(100, 1), record(150, 2)];
        let buckets = aggregate(&records, 10).expect("non-empty input");

        assert_eq!(buckets.len(), 6);
        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1]);
        let starts: Vec<i64> = buckets.iter().map(|b| b.start_epoch).collect();
        assert_eq!(starts, vec![100, 110, 120, 130, 140, 150]);
    }

    #[test]
    fn test_anchor_floors_to_width_multiple() {
        let records = vec![record(107, 1), record(112, 2)];
        let buckets = aggregate(&records, 10).expect("non-empty input");

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start_epoch, 100);
        assert_eq!(buckets[1].start_epoch, 110);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_unsorted_records_land_in_their_buckets() {
        let records = vec![record(125, 1), record(101, 2), record(128, 3)];
        let buckets = aggregate(&records, 10).expect("non-empty input");

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 0);
        assert_eq!(buckets[2].count, 2);
        assert_eq!(buckets[2].records, vec![0, 2]);
    }
}
