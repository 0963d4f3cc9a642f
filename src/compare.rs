#![forbid(unsafe_code)]
//! Line-scan versus indexed range read timing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::storage::{StoreOptions, StoreReader};
use crate::types::{FlatAdjError, Result};

/// Timings for reading the same record range both ways.
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    /// First record of the range.
    pub start: u64,
    /// One past the last record.
    pub end: u64,
    /// Lines materialized from the text file.
    pub text_lines: u64,
    /// Records decoded from the store.
    pub store_records: u64,
    /// Elapsed time for the text scan, including open.
    pub text_ms: f64,
    /// Elapsed time for the store read, including open.
    pub store_ms: f64,
}

impl CompareReport {
    /// Text time over store time; `None` when the store read was too fast to measure.
    pub fn speedup(&self) -> Option<f64> {
        (self.store_ms > 0.0).then(|| self.text_ms / self.store_ms)
    }
}

/// Materializes lines `[start, end)` of a text file by scanning from the top.
///
/// Like slicing a list of lines, a file shorter than `end` yields fewer lines.
pub fn scan_lines(path: impl AsRef<Path>, start: u64, end: u64) -> Result<Vec<String>> {
    if start > end {
        return Err(FlatAdjError::Invalid("line range start is after its end"));
    }
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let index = index as u64;
        if index >= end {
            break;
        }
        let line = line?;
        if index >= start {
            out.push(line.trim().to_string());
        }
    }
    Ok(out)
}

/// Times [`scan_lines`] against [`StoreReader::read_range`] for the same range.
pub fn compare_range(
    text_path: impl AsRef<Path>,
    store_path: impl AsRef<Path>,
    start: u64,
    end: u64,
) -> Result<CompareReport> {
    let text_started = Instant::now();
    let lines = scan_lines(text_path, start, end)?;
    let text_ms = text_started.elapsed().as_secs_f64() * 1_000.0;

    let store_started = Instant::now();
    let reader = StoreReader::open(store_path, &StoreOptions::default())?;
    let records = reader.read_range(start, end)?;
    let store_ms = store_started.elapsed().as_secs_f64() * 1_000.0;

    let report = CompareReport {
        start,
        end,
        text_lines: lines.len() as u64,
        store_records: records.len() as u64,
        text_ms,
        store_ms,
    };
    info!(
        start,
        end,
        text_ms = report.text_ms,
        store_ms = report.store_ms,
        "compare.completed"
    );
    Ok(report)
}
