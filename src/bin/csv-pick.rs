//! Copies the first or last N CSV rows from standard input to standard
//! output.
//!
//! ```text
//! csv-pick head 100 < comments.csv > sample.csv
//! ```

use std::io::{self, BufReader, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use review_harvest::{HarvestError, Picker, init_logging, pick};

/// Command-line arguments for `csv-pick`.
#[derive(Debug, Parser)]
#[command(version, about = "Copy a leading or trailing run of CSV rows")]
struct Args {
    /// Which end of the input to keep.
    #[arg(value_enum)]
    picker: Picker,
    /// Number of rows to keep.
    count: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(false);
    match run(&args) {
        Ok(rows) => {
            tracing::debug!(rows, "picked rows");
            ExitCode::SUCCESS
        }
        Err(error) => {
            if writeln!(io::stderr().lock(), "ERROR: {error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<u64, HarvestError> {
    let input = BufReader::new(io::stdin().lock());
    let output = BufWriter::new(io::stdout().lock());
    pick(input, output, args.picker, args.count)
}
