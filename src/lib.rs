//! # tzip Core Library
//!
//! This crate compresses every `.txt` file of a directory into a single
//! `.tzip` archive, using a fixed pool of worker threads while keeping the
//! records in the byte-wise order of the file names.
//!
//! It is designed to be used by the `tzip` command-line application, but the
//! pipeline pieces are public so they can be driven programmatically.
//!
//! ## Key Modules
//!
//! - [`common`]: The sorted input [`FileList`](common::FileList) and the `.txt` directory scan.
//! - [`compress`]: The [`Compressor`](compress::Compressor) seam and its zlib implementation.
//! - [`workers`]: Work distribution, the slot table and the worker pool.
//! - [`archive`]: Writing, reading and verifying the record stream.
//! - [`progress`]: Byte statistics and the run summary.
//!
//! ## Examples
//!
//! ```no_run
//! use tzip::compress::CompressOptions;
//!
//! let options = CompressOptions::new("notes").with_output("notes.tzip").with_threads(4);
//! let summary = tzip::workers::run_parallel_compression(&options)?;
//! println!("{}", summary.ratio_line());
//! # Ok::<(), tzip::TzipError>(())
//! ```

pub mod archive;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod compress;
pub mod error;
pub use error::{Result, TzipError};

pub mod progress;
pub mod workers;

// Cross-platform filesystem helpers
pub mod fsx;
