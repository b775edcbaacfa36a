//! # Compression
//!
//! Each input file is compressed independently into a zlib stream (RFC 1950).
//! The [`Compressor`] trait is the seam the worker pool calls through; the
//! production implementation is [`ZlibCompressor`], backed by `flate2`.
//!
//! Output space is reserved up front using zlib's worst-case expansion bound
//! and grows past it if the engine needs more. [`CompressError::EngineFailure`]
//! is reserved for errors reported by the engine itself.

use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::error::{Result, TzipError};

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 15;
/// Default zlib level (maximum effort).
pub const DEFAULT_LEVEL: u32 = 9;
/// Default archive file name, created relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "text.tzip";

/// Errors raised by a [`Compressor`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressError {
    /// The deflate engine reported an error while writing or finishing the stream.
    #[error("deflate engine failure: {0}")]
    EngineFailure(String),
}

/// Compresses one in-memory buffer into another.
///
/// Implementations must be deterministic: identical input yields identical output.
pub trait Compressor: Send + Sync {
    fn compress(&self, input: &[u8]) -> std::result::Result<Vec<u8>, CompressError>;
}

/// zlib's documented worst-case size of a stream holding `len` input bytes.
///
/// Used as the initial output reservation only.
pub fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// zlib compressor with a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: Compression,
}

impl ZlibCompressor {
    /// Creates a compressor for `level` (0-9). Values above 9 are clamped.
    pub fn new(level: u32) -> Self {
        Self { level: Compression::new(level.min(9)) }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, input: &[u8]) -> std::result::Result<Vec<u8>, CompressError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(compress_bound(input.len())), self.level);
        encoder
            .write_all(input)
            .map_err(|e| CompressError::EngineFailure(e.to_string()))?;
        encoder.finish().map_err(|e| CompressError::EngineFailure(e.to_string()))
    }
}

/// Decodes one zlib stream back into the original bytes.
pub fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Handling of per-file failures.
#[derive(clap::ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run; no archive is written.
    #[default]
    Abort,
    /// Log the file and leave it out of the archive.
    Skip,
}

/// Holds all configuration options for one compression run.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Directory whose `.txt` children are archived.
    pub source_dir: PathBuf,
    /// Archive path. Written atomically: nothing appears here unless the run succeeds.
    pub output: PathBuf,
    /// Worker thread count. `0` selects the number of logical CPUs.
    pub threads: usize,
    /// zlib level, 0-9.
    pub level: u32,
    /// What to do when a single file cannot be read or compressed.
    pub on_error: ErrorPolicy,
    /// Re-read and inflate the archive after writing it.
    pub verify: bool,
}

impl CompressOptions {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            threads: DEFAULT_THREADS,
            level: DEFAULT_LEVEL,
            on_error: ErrorPolicy::Abort,
            verify: false,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Thread count after resolving `0` to the CPU count.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level > 9 {
            return Err(TzipError::InvalidConfig(format!(
                "compression level must be between 0 and 9, got {}",
                self.level
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(TzipError::InvalidConfig("output path is empty".into()));
        }
        Ok(())
    }
}
