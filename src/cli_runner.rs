//! CLI runner shared by the `tzip` binary: logging setup, the run itself and
//! the stdout report.

use tracing_subscriber::EnvFilter;

use crate::cli::{self, Args, ReportFormat};
use crate::progress::RunSummary;
use crate::workers;

/// Public entry for running the CLI.
pub fn run_cli_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run();
    init_logging(args.verbose);
    run_with_args(&args)
}

/// Runs one compression job described by `args` and prints its report.
pub fn run_with_args(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let summary = workers::run_parallel_compression(&args.to_options())?;
    print_report(&summary, args.report)?;
    Ok(())
}

fn print_report(summary: &RunSummary, format: ReportFormat) -> Result<(), serde_json::Error> {
    match format {
        ReportFormat::Text => {
            if !summary.skipped.is_empty() {
                eprintln!("Skipped {} file(s): {}", summary.skipped.len(), summary.skipped.join(", "));
            }
            println!("{}", summary.ratio_line());
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

/// Installs a stderr `fmt` subscriber. `RUST_LOG` overrides the `-v` count.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
