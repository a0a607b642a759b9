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

//! Reads newline-delimited log files into raw lines.
//!
//! `.vlog` containers are treated identically to `.log`/`.txt`; the extension
//! is not inspected at all. One batch is one immutable snapshot.

use crate::parser::line::RawLine;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read one file with lossy UTF-8 conversion so that stray binary bytes do
/// not reject the whole file.
pub fn load_path(path: &Path) -> std::io::Result<Vec<RawLine>> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    let content = String::from_utf8_lossy(&buffer);
    log::info!("read {} bytes from {}", buffer.len(), path.display());
    Ok(lines_from_str(&content))
}

/// Split text into 1-based numbered raw lines. Blank lines are kept: they
/// surface downstream as `MissingTimestamp` failures rather than vanishing.
pub fn lines_from_str(content: &str) -> Vec<RawLine> {
    content
        .lines()
        .enumerate()
        .map(|(index, text)| RawLine::new(text, index + 1))
        .collect()
}

/// Read several files into one batch. Line numbering is continuous across
/// the batch so that every source line keeps a unique identity.
pub fn load_batch(paths: &[PathBuf]) -> std::io::Result<Vec<RawLine>> {
    let mut lines: Vec<RawLine> = Vec::new();
    for path in paths {
        let base = lines.len();
        let file_lines = load_path(path)?;
        lines.extend(
            file_lines
                .into_iter()
                .map(|line| RawLine::new(line.text, base + line.number)),
        );
    }
    Ok(lines)
}
