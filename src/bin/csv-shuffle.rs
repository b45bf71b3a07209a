//! Writes the CSV rows read from standard input to standard output in a
//! random order.

use std::io::{self, BufReader, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use review_harvest::{HarvestError, init_logging, shuffle};

/// Command-line arguments for `csv-shuffle`.
#[derive(Debug, Parser)]
#[command(version, about = "Randomly permute CSV rows")]
struct Args {
    /// Seed for a reproducible order; drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(false);
    match run(&args) {
        Ok(rows) => {
            tracing::debug!(rows, "shuffled rows");
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
    let mut rng = args
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let input = BufReader::new(io::stdin().lock());
    let output = BufWriter::new(io::stdout().lock());
    shuffle(input, output, &mut rng)
}
