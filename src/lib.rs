//! Review-harvest library crate for collecting pull request review comments.
//!
//! The library walks a repository's pull requests through GitHub's GraphQL
//! API, flattens their review comments into `(path, body)` rows, and writes
//! them as CSV. It also carries the row tools behind the `csv-pick` and
//! `csv-shuffle` binaries.

use std::io::IsTerminal;

pub mod config;
pub mod github;
pub mod harvest;
pub mod rows;

pub use config::HarvestConfig;
pub use github::{
    HarvestError, PersonalAccessToken, QueryExecutor, RepositoryLocator, ReqwestTransport,
    ReviewComment,
};
pub use harvest::{HarvestOptions, HarvestReport, download};
pub use rows::{Picker, pick, shuffle};

/// Installs a `tracing` subscriber that writes to standard error.
///
/// `RUST_LOG` takes precedence; otherwise `info` is used, or `debug` when
/// `verbose` is set. Installing twice is a no-op.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _already_installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
