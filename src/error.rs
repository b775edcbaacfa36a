use std::path::PathBuf;

use thiserror::Error;

use crate::compress::CompressError;

/// The primary error type for all operations in the `tzip` crate.
#[derive(Debug, Error)]
pub enum TzipError {
    /// The source directory is missing or cannot be listed.
    #[error("cannot open directory '{}': {source}", .path.display())]
    DirectoryUnreadable { path: PathBuf, source: std::io::Error },

    /// An input file could not be opened or read.
    #[error("cannot read '{}': {source}", .path.display())]
    FileRead { path: PathBuf, source: std::io::Error },

    /// The deflate engine failed on an input file.
    #[error("cannot compress '{}': {source}", .path.display())]
    Compress { path: PathBuf, source: CompressError },

    /// A compressed payload does not fit the 32-bit record length field.
    #[error("compressed size of '{}' ({size} bytes) exceeds the 32-bit record limit", .path.display())]
    RecordTooLarge { path: PathBuf, size: usize },

    /// The archive could not be created, written, flushed or persisted.
    #[error("I/O error on output '{}': {source}", .path.display())]
    OutputWrite { path: PathBuf, source: std::io::Error },

    /// An archive record could not be read back or decoded.
    #[error("corrupt archive at byte {offset}: {reason}")]
    CorruptArchive { offset: u64, reason: String },

    /// A worker thread panicked before finishing its loop.
    #[error("a worker thread panicked")]
    WorkerPanicked,

    /// Options rejected before the run starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TzipError>;

impl TzipError {
    /// Whether the error belongs to a single input file, which makes it
    /// eligible for the skip policy.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            TzipError::FileRead { .. } | TzipError::Compress { .. } | TzipError::RecordTooLarge { .. }
        )
    }
}
