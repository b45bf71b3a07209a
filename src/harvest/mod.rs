//! Review comment harvesting into a two-column CSV file.
//!
//! [`download`] composes the pipeline: merged pull requests are enumerated
//! page by page, unreviewed ones are skipped, the comments of the rest are
//! flattened, filtered by file extension, capped at an optional row count and
//! written as `(path, body)` rows. Every stage is a lazy iterator, so reaching
//! the row cap stops all further queries.

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;

use crate::github::{
    GraphQlTransport, HarvestError, PullRequestState, QueryExecutor, RepositoryLocator,
    ReviewComment, ReviewComments,
};
use crate::rows::csv_writer;

/// File extension harvested when none is configured.
pub const DEFAULT_EXTENSION: &str = ".kt";

/// Filters applied between enumeration and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Pull request state to enumerate.
    pub state: PullRequestState,
    /// Path suffix a comment must have; empty keeps every comment.
    pub extension: String,
    /// Maximum rows to write; `None` or zero means no cap.
    pub max_rows: Option<u64>,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            state: PullRequestState::Merged,
            extension: DEFAULT_EXTENSION.to_owned(),
            max_rows: None,
        }
    }
}

impl HarvestOptions {
    /// Row cap as an iterator bound.
    #[must_use]
    pub fn row_limit(&self) -> usize {
        match self.max_rows {
            None | Some(0) => usize::MAX,
            Some(limit) => usize::try_from(limit).unwrap_or(usize::MAX),
        }
    }

    fn describe_cap(&self) -> String {
        match self.max_rows {
            None | Some(0) => "none".to_owned(),
            Some(limit) => limit.to_string(),
        }
    }
}

/// Outcome of a completed harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestReport {
    /// Rows written to the output.
    pub rows_written: u64,
    /// Pull requests whose review comments were requested.
    pub pull_requests_queried: u64,
}

/// Applies the extension filter and then the row cap to a comment stream.
///
/// Comments dropped by the filter do not count toward the cap. Errors pass
/// through unfiltered.
pub fn select_comments<'a, I>(
    comments: I,
    options: &'a HarvestOptions,
) -> impl Iterator<Item = Result<ReviewComment, HarvestError>> + 'a
where
    I: Iterator<Item = Result<ReviewComment, HarvestError>> + 'a,
{
    let extension = options.extension.as_str();
    comments
        .filter(move |item| {
            item.as_ref()
                .map_or(true, |comment| comment.path_ends_with(extension))
        })
        .take(options.row_limit())
}

/// Writes each comment as a `(path, body)` row and returns the row count.
///
/// The writer is flushed once every comment was written. On error the rows
/// written so far remain in `writer`.
///
/// # Errors
///
/// Returns the first error yielded by `comments`, or [`HarvestError::Io`] /
/// [`HarvestError::Csv`] when writing fails.
pub fn write_comment_rows<W, I>(writer: W, comments: I) -> Result<u64, HarvestError>
where
    W: Write,
    I: IntoIterator<Item = Result<ReviewComment, HarvestError>>,
{
    let mut csv_output = csv_writer(writer);
    let mut rows: u64 = 0;
    for item in comments {
        let comment = item?;
        csv_output.write_record([comment.path.as_str(), comment.body.as_str()])?;
        rows += 1;
    }
    csv_output.flush()?;
    Ok(rows)
}

/// Downloads the review comments of `locator` into a CSV file at `output`.
///
/// The file is created (or truncated) before the first query is sent.
///
/// # Errors
///
/// Returns [`HarvestError::Io`] when the output file cannot be created and
/// propagates any query, decoding, or write failure.
pub fn download<T: GraphQlTransport>(
    executor: &QueryExecutor<T>,
    locator: &RepositoryLocator,
    output: &Utf8Path,
    options: &HarvestOptions,
) -> Result<HarvestReport, HarvestError> {
    tracing::info!(
        "Downloading PR comments from {locator} (max={})",
        options.describe_cap()
    );

    let file = File::create(output).map_err(|error| HarvestError::Io {
        message: format!("failed to create output file '{output}': {error}"),
    })?;

    let mut stream = ReviewComments::new(executor, locator, options.state);
    let rows_written = write_comment_rows(
        BufWriter::new(file),
        select_comments(stream.by_ref(), options),
    )?;
    let report = HarvestReport {
        rows_written,
        pull_requests_queried: stream.pull_requests_queried(),
    };

    tracing::info!(
        rows = report.rows_written,
        pull_requests = report.pull_requests_queried,
        "wrote review comments to {output}"
    );
    Ok(report)
}
