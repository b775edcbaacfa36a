use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

pub use crate::compress::ErrorPolicy;
use crate::compress::{CompressOptions, DEFAULT_LEVEL, DEFAULT_OUTPUT, DEFAULT_THREADS};

/// Compress every `.txt` file of a directory into a single archive.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory whose `.txt` files are compressed. Subdirectories are not visited.
    #[arg(required = true)]
    pub source_dir: PathBuf,

    /// The path for the output archive.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Number of worker threads. [0 = auto-detect based on CPU cores]
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// zlib compression level (0-9).
    #[arg(short, long, default_value_t = DEFAULT_LEVEL, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,

    /// What to do when a file cannot be read or compressed.
    #[arg(long, value_enum, default_value_t = ErrorPolicy::Abort)]
    pub on_error: ErrorPolicy,

    /// Re-read the archive and decompress every record before keeping it.
    #[arg(long)]
    pub verify: bool,

    /// Format of the report printed on success.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,

    /// Increase log verbosity on stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn to_options(&self) -> CompressOptions {
        CompressOptions::new(&self.source_dir)
            .with_output(&self.output)
            .with_threads(self.threads)
            .with_level(self.level)
            .with_error_policy(self.on_error)
            .with_verify(self.verify)
    }
}

/// Report printed to stdout on success.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// `Compression rate: NN.NN%`
    Text,
    /// The full run summary as JSON.
    Json,
}

/// Parses command-line arguments using `clap`, exiting with usage on bad input.
pub fn run() -> Args {
    Args::parse()
}
