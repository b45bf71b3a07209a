//! Selection of a leading or trailing run of CSV rows.

use std::collections::VecDeque;
use std::io::{Read, Write};

use clap::ValueEnum;
use csv::StringRecord;

use super::{csv_reader, write_records};
use crate::github::HarvestError;

/// Which end of the input to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Picker {
    /// The first rows.
    Head,
    /// The last rows.
    Tail,
}

impl Picker {
    /// Selects up to `count` records from `records`.
    ///
    /// `Head` stops reading once `count` records were taken; `Tail` holds at
    /// most `count` records while it drains the input.
    ///
    /// # Errors
    ///
    /// Returns the first read failure.
    pub fn select<I>(self, records: I, count: usize) -> Result<Vec<StringRecord>, HarvestError>
    where
        I: IntoIterator<Item = csv::Result<StringRecord>>,
    {
        match self {
            Self::Head => Ok(records
                .into_iter()
                .take(count)
                .collect::<Result<Vec<_>, _>>()?),
            Self::Tail => select_tail(records, count),
        }
    }
}

fn select_tail<I>(records: I, count: usize) -> Result<Vec<StringRecord>, HarvestError>
where
    I: IntoIterator<Item = csv::Result<StringRecord>>,
{
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut window = VecDeque::new();
    for result in records {
        let record = result?;
        if window.len() == count {
            window.pop_front();
        }
        window.push_back(record);
    }
    Ok(window.into())
}

/// Copies the `count` rows picked by `picker` from `input` to `output`.
///
/// Rows are written unchanged and in their original order.
///
/// # Errors
///
/// Returns [`HarvestError::Csv`] for malformed input and
/// [`HarvestError::Io`] when reading or writing fails.
pub fn pick<R: Read, W: Write>(
    input: R,
    output: W,
    picker: Picker,
    count: usize,
) -> Result<u64, HarvestError> {
    let mut reader = csv_reader(input);
    let selected = picker.select(reader.records(), count)?;
    write_records(output, selected)
}
