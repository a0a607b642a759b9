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

//! Serialization for the rendering/export collaborator.
//!
//! Records round-trip through JSON and CSV (absent fields map to `null` and
//! the empty cell respectively; no legal field value is the empty string, so
//! the CSV mapping is lossless). The tab-delimited text form and the bucket
//! CSV are one-way: bucket record indices are only representable in JSON.

use crate::anomaly::reconcile::CombinedFlag;
use crate::core::bucket::TimeBucket;
use crate::core::session::AnalysisReport;
use crate::parser::line::{LogRecord, ParseFailure};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv writer: {0}")]
    Flush(String),
    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },
}

const RECORD_HEADERS: [&str; 7] = [
    "timestamp",
    "event_type",
    "username",
    "ip_address",
    "file_path",
    "process_id",
    "source_line",
];

pub fn records_to_json(records: &[LogRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

pub fn records_from_json(json: &str) -> serde_json::Result<Vec<LogRecord>> {
    serde_json::from_str(json)
}

pub fn records_to_csv(records: &[LogRecord]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(RECORD_HEADERS)?;
    for record in records {
        writer.write_record([
            record.timestamp.to_string(),
            record.event_type.clone().unwrap_or_default(),
            record.username.clone().unwrap_or_default(),
            record.ip_address.clone().unwrap_or_default(),
            record.file_path.clone().unwrap_or_default(),
            record.process_id.map(|pid| pid.to_string()).unwrap_or_default(),
            record.source_line.to_string(),
        ])?;
    }
    into_string(writer)
}

pub fn records_from_csv(data: &str) -> Result<Vec<LogRecord>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());
    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        // Header occupies row 1 of the file
        let row_number = index + 2;
        records.push(LogRecord {
            timestamp: required(&row, 0, row_number, "timestamp")?,
            event_type: optional_text(&row, 1),
            username: optional_text(&row, 2),
            ip_address: optional_text(&row, 3),
            file_path: optional_text(&row, 4),
            process_id: optional_number(&row, 5, row_number, "process_id")?,
            source_line: required(&row, 6, row_number, "source_line")?,
        });
    }
    Ok(records)
}

/// One-way, human-oriented tab-delimited form; absent fields print as `-`.
pub fn records_to_txt(records: &[LogRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", RECORD_HEADERS.join("\t"));
    for record in records {
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.timestamp,
            record.event_type.as_deref().unwrap_or("-"),
            record.username.as_deref().unwrap_or("-"),
            record.ip_address.as_deref().unwrap_or("-"),
            record.file_path.as_deref().unwrap_or("-"),
            record
                .process_id
                .map_or_else(|| "-".to_string(), |pid| pid.to_string()),
            record.source_line,
        );
    }
    out
}

pub fn failures_to_csv(failures: &[ParseFailure]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["source_line", "reason"])?;
    for failure in failures {
        writer.write_record([failure.source_line.to_string(), failure.reason.to_string()])?;
    }
    into_string(writer)
}

/// Bucket timeline as CSV. The `start_time` column is a derived RFC 3339
/// rendering of `start_epoch`; the record index list is JSON-only.
pub fn buckets_to_csv(buckets: &[TimeBucket]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["start_epoch", "start_time", "width_seconds", "count"])?;
    for bucket in buckets {
        let start_time = chrono::DateTime::from_timestamp(bucket.start_epoch, 0)
            .map_or_else(String::new, |time| time.to_rfc3339());
        writer.write_record([
            bucket.start_epoch.to_string(),
            start_time,
            bucket.width_seconds.to_string(),
            bucket.count.to_string(),
        ])?;
    }
    into_string(writer)
}

pub fn flags_to_json(flags: &[CombinedFlag]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(flags)
}

/// The whole run as one JSON document, sections keyed by stage.
pub fn report_to_json(report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "summary": report.summary,
        "records": report.records,
        "failures": report.failures,
        "buckets": report.buckets,
        "zscore_flags": report.zscore_flags,
        "model_flags": report.model_flags,
        "model_error": report.model_error.as_ref().map(ToString::to_string),
        "anomalies": report.combined,
    }))
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|error| ExportError::Flush(error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| ExportError::Flush(error.to_string()))
}

fn field<'r>(row: &'r csv::StringRecord, index: usize) -> &'r str {
    row.get(index).unwrap_or("")
}

fn optional_text(row: &csv::StringRecord, index: usize) -> Option<String> {
    let value = field(row, index);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn required<T: std::str::FromStr>(
    row: &csv::StringRecord,
    index: usize,
    row_number: usize,
    name: &str,
) -> Result<T, ExportError>
where
    T::Err: std::fmt::Display,
{
    field(row, index).parse().map_err(|error| ExportError::Malformed {
        row: row_number,
        message: format!("bad {name}: {error}"),
    })
}

fn optional_number(
    row: &csv::StringRecord,
    index: usize,
    row_number: usize,
    name: &str,
) -> Result<Option<u32>, ExportError> {
    let value = field(row, index);
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|error| ExportError::Malformed {
            row: row_number,
            message: format!("bad {name}: {error}"),
        })
}
