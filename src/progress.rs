//! Byte accounting for a compression run.
//!
//! Workers bump [`Statistics`] with relaxed atomic adds; the totals are only
//! read after the pool has been joined, when they feed the final
//! [`RunSummary`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Totals shared by all workers.
#[derive(Debug, Default)]
pub struct Statistics {
    files: AtomicU64,
    total_in: AtomicU64,
    total_out: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one compressed file.
    pub fn record(&self, bytes_in: u64, bytes_out: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.total_in.fetch_add(bytes_in, Ordering::Relaxed);
        self.total_out.fetch_add(bytes_out, Ordering::Relaxed);
    }

    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    pub fn total_in(&self) -> u64 {
        self.total_in.load(Ordering::Relaxed)
    }

    pub fn total_out(&self) -> u64 {
        self.total_out.load(Ordering::Relaxed)
    }
}

/// Space saved, as a percentage of the input size.
///
/// `None` when there was no input at all. Negative when the archive grew.
pub fn compression_ratio(total_in: u64, total_out: u64) -> Option<f64> {
    if total_in == 0 {
        return None;
    }
    Some(100.0 * (total_in as f64 - total_out as f64) / total_in as f64)
}

/// Outcome of a successful run, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Matched `.txt` files.
    pub files: usize,
    /// Records written to the archive.
    pub records: usize,
    /// Files left out under the skip policy.
    pub skipped: Vec<String>,
    pub total_in: u64,
    pub total_out: u64,
    pub ratio_percent: Option<f64>,
    pub threads: usize,
    pub output: PathBuf,
}

impl RunSummary {
    /// One-line report, e.g. `Compression rate: 42.17%`.
    pub fn ratio_line(&self) -> String {
        match self.ratio_percent {
            Some(ratio) => format!("Compression rate: {ratio:.2}%"),
            None => "Compression rate: n/a".to_string(),
        }
    }
}
