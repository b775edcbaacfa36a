//! Parallel compression of a directory into one archive.
//!
//! ## Strategy
//!
//! 1. The source directory is scanned into a sorted [`FileList`].
//! 2. A fixed pool of threads claims file indices from a shared
//!    [`WorkDistributor`], compresses each file independently and stores the
//!    result in its own slot of a [`SlotTable`].
//! 3. Once every worker has been joined, the main thread drains the slots in
//!    index order into a temporary archive, which is persisted at the output
//!    path only if nothing failed.

mod distributor;
mod pool;
mod slots;

pub use distributor::WorkDistributor;
pub use pool::{PoolOutcome, WorkerPool};
pub use slots::{Slot, SlotTable};

use std::path::Path;
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::archive::{verify_archive, write_slots, ArchiveWriter};
use crate::common::{collect_text_files, FileList};
use crate::compress::{CompressOptions, Compressor, ZlibCompressor};
use crate::error::{Result, TzipError};
use crate::fsx;
use crate::progress::{compression_ratio, RunSummary, Statistics};

/// Scans `options.source_dir` and compresses every `.txt` file in it into `options.output`.
pub fn run_parallel_compression(options: &CompressOptions) -> Result<RunSummary> {
    options.validate()?;
    let files = collect_text_files(&options.source_dir)?;
    let compressor = ZlibCompressor::new(options.level);
    compress_file_list(&files, options, &compressor)
}

/// Compresses an already sorted file list with the given compressor.
///
/// `options.source_dir` is ignored; paths come from `files`.
pub fn compress_file_list(files: &FileList, options: &CompressOptions, compressor: &dyn Compressor) -> Result<RunSummary> {
    options.validate()?;
    let threads = options.effective_threads();
    let started = Instant::now();
    tracing::info!(
        source = %files.root().display(),
        files = files.len(),
        threads,
        level = options.level,
        "starting compression run"
    );

    let stats = Statistics::new();
    let outcome = WorkerPool::new(threads, files, compressor, options.on_error).run(&stats)?;
    let skipped: Vec<String> = outcome
        .skipped
        .iter()
        .filter_map(|&i| files.name(i))
        .map(|name| name.to_string_lossy().into_owned())
        .collect();

    let output = &options.output;
    let tmp = create_temp_beside(output)?;
    let mut writer = ArchiveWriter::new(tmp, output);
    let records = write_slots(&mut writer, outcome.slots, files)?;
    let tmp = writer.finish()?;

    if options.verify {
        let inflated = verify_archive(tmp.path(), records)?;
        if inflated != stats.total_in() {
            return Err(TzipError::CorruptArchive {
                offset: 0,
                reason: format!("archive inflates to {inflated} bytes, expected {}", stats.total_in()),
            });
        }
        tracing::info!(records, inflated, "archive verified");
    }

    fsx::set_unix_permissions(tmp.path(), 0o644).map_err(|source| output_error(output, source))?;
    tmp.persist(output).map_err(|e| output_error(output, e.error))?;

    let summary = RunSummary {
        files: files.len(),
        records,
        skipped,
        total_in: stats.total_in(),
        total_out: stats.total_out(),
        ratio_percent: compression_ratio(stats.total_in(), stats.total_out()),
        threads,
        output: output.clone(),
    };
    tracing::info!(
        records,
        total_in = summary.total_in,
        total_out = summary.total_out,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "compression run finished"
    );
    Ok(summary)
}

/// Temporary file in the output's directory, so the final rename stays on one filesystem.
fn create_temp_beside(output: &Path) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).map_err(|source| output_error(output, source))
}

fn output_error(path: &Path, source: std::io::Error) -> TzipError {
    TzipError::OutputWrite { path: path.to_path_buf(), source }
}
