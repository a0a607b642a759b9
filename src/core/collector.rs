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

//! Assembles a sequence of raw lines into a validated record set.

use crate::parser::extract::extract;
use crate::parser::line::{LogRecord, ParseFailure, RawLine};
use indexmap::IndexSet;
use serde::Serialize;

/// The validated output of one parse pass: every input line lands in exactly
/// one of the two sequences, both in original input order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub records: Vec<LogRecord>,
    pub failures: Vec<ParseFailure>,
}

/// Set cardinalities over present-only field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_lines: usize,
    pub parsed: usize,
    pub failed: usize,
    pub distinct_usernames: usize,
    pub distinct_event_types: usize,
    pub distinct_ips: usize,
}

/// Parse every line independently. Never stops on a failure; every rejected
/// line is collected for operator review.
pub fn collect(lines: &[RawLine]) -> Collection {
    let mut collection = Collection::default();
    for line in lines {
        match extract(line) {
            Ok(record) => collection.records.push(record),
            Err(failure) => collection.failures.push(failure),
        }
    }
    log::debug!(
        "collected {} records, {} failures from {} lines",
        collection.records.len(),
        collection.failures.len(),
        lines.len()
    );
    collection
}

/// Distinct extracted IP addresses in first-seen order, for the geolocation
/// handoff. The core never looks these up itself.
pub fn distinct_ips(records: &[LogRecord]) -> IndexSet<&str> {
    records
        .iter()
        .filter_map(|record| record.ip_address.as_deref())
        .collect()
}

impl Collection {
    pub fn summary(&self) -> Summary {
        let usernames: IndexSet<&str> = self
            .records
            .iter()
            .filter_map(|record| record.username.as_deref())
            .collect();
        let event_types: IndexSet<&str> = self
            .records
            .iter()
            .filter_map(|record| record.event_type.as_deref())
            .collect();

        Summary {
            total_lines: self.records.len() + self.failures.len(),
            parsed: self.records.len(),
            failed: self.failures.len(),
            distinct_usernames: usernames.len(),
            distinct_event_types: event_types.len(),
            distinct_ips: distinct_ips(&self.records).len(),
        }
    }

    pub fn distinct_ips(&self) -> IndexSet<&str> {
        distinct_ips(&self.records)
    }
}
