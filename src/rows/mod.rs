//! Row-level tools for the two-column CSV files produced by the harvester.
//!
//! Every tool in this module reads and writes headerless CSV with `\r\n`
//! record terminators and minimal quoting, so the output of one tool can be
//! piped straight into the next.
//!
//! - [`pick`]: keep a leading or trailing run of rows
//! - [`shuffle`]: randomly permute all rows

use std::io::{Read, Write};

use csv::StringRecord;

use crate::github::HarvestError;

mod pick;
mod shuffle;

pub use pick::{Picker, pick};
pub use shuffle::shuffle;

/// Builds the CSV writer shared by every tool.
///
/// Rows may differ in width, matching what [`csv_reader`] accepts.
pub fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer)
}

/// Builds a headerless CSV reader that accepts rows of varying width.
pub fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

/// Writes every record and flushes the writer.
///
/// # Errors
///
/// Returns [`HarvestError::Io`] or [`HarvestError::Csv`] when writing fails.
pub fn write_records<W, I>(writer: W, records: I) -> Result<u64, HarvestError>
where
    W: Write,
    I: IntoIterator<Item = StringRecord>,
{
    let mut csv_output = csv_writer(writer);
    let mut written: u64 = 0;
    for record in records {
        csv_output.write_record(&record)?;
        written += 1;
    }
    csv_output.flush()?;
    Ok(written)
}
