//! Random permutation of CSV rows.

use std::io::{Read, Write};

use csv::StringRecord;
use rand::Rng;
use rand::seq::SliceRandom;

use super::{csv_reader, write_records};
use crate::github::HarvestError;

/// Reads every row from `input` and writes them to `output` in an order
/// drawn uniformly at random from `rng`.
///
/// # Errors
///
/// Returns [`HarvestError::Csv`] for malformed input and
/// [`HarvestError::Io`] when reading or writing fails.
pub fn shuffle<R, W, G>(input: R, output: W, rng: &mut G) -> Result<u64, HarvestError>
where
    R: Read,
    W: Write,
    G: Rng + ?Sized,
{
    let mut reader = csv_reader(input);
    let mut records: Vec<StringRecord> = reader.records().collect::<Result<_, _>>()?;
    records.shuffle(rng);
    write_records(output, records)
}
