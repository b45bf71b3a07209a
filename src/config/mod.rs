//! Downloader configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line flags, environment variables, and configuration files
//! using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.review-harvest.toml` in current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `REVIEW_HARVEST_TOKEN`,
//!    `REVIEW_HARVEST_MAX`, and so on; `GITHUB_TOKEN` is honoured as a
//!    fallback for the token
//! 4. **Command-line arguments** – `--token`/`-t`, `--output`/`-o`,
//!    `--max`/`-x`, ...
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! extension = ".kt"
//! state = "MERGED"
//! max = 500
//! ```

use std::env;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::error::HarvestError;
use crate::github::graphql::DEFAULT_ENDPOINT;
use crate::github::{GraphQlClientConfig, PersonalAccessToken, PullRequestState, RepositoryLocator};
use crate::harvest::{DEFAULT_EXTENSION, HarvestOptions};

const DEFAULT_STATE: &str = "MERGED";
const DEFAULT_RETRIES: u32 = 3;

/// Legacy token variable read when no other source provides one.
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Downloader configuration supporting CLI, environment, and file sources.
///
/// The repository owner and name are positional arguments and are not part
/// of this struct.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use review_harvest::HarvestConfig;
///
/// let config = HarvestConfig::load().expect("failed to load configuration");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REVIEW_HARVEST",
    discovery(
        dotfile_name = ".review-harvest.toml",
        config_file_name = "review-harvest.toml",
        app_name = "review-harvest"
    )
)]
pub struct HarvestConfig {
    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `REVIEW_HARVEST_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Output CSV path; defaults to `{owner}-{name}.csv`.
    #[ortho_config(cli_short = 'o')]
    pub output: Option<String>,

    /// Maximum number of comments to write. Zero means no cap.
    #[ortho_config(cli_short = 'x')]
    pub max: Option<u64>,

    /// File path suffix a comment must have. Empty keeps every comment.
    pub extension: String,

    /// Pull request state to harvest: `OPEN`, `CLOSED`, or `MERGED`.
    pub state: String,

    /// GitHub GraphQL endpoint.
    pub api_url: String,

    /// Resends after a connection failure, a timeout, or a `429`/`5xx`
    /// gateway response.
    pub retries: u32,

    /// Skips the schema introspection query sent before the first query.
    ///
    /// Note: booleans are not loaded from the environment by `ortho_config`.
    pub skip_schema_discovery: bool,

    /// Enables debug logging.
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            token: None,
            output: None,
            max: None,
            extension: DEFAULT_EXTENSION.to_owned(),
            state: DEFAULT_STATE.to_owned(),
            api_url: DEFAULT_ENDPOINT.to_owned(),
            retries: DEFAULT_RETRIES,
            skip_schema_discovery: false,
            verbose: false,
        }
    }
}

impl HarvestConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MissingToken`] when no source provides a
    /// non-blank value.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, HarvestError> {
        let value = self
            .token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| env::var(GITHUB_TOKEN_VAR).ok())
            .ok_or(HarvestError::MissingToken)?;
        PersonalAccessToken::new(value)
    }

    /// Parses the configured pull request state.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] for an unknown state.
    pub fn pull_request_state(&self) -> Result<PullRequestState, HarvestError> {
        self.state.parse()
    }

    /// Builds the filters applied by the harvest driver.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] for an unknown state.
    pub fn harvest_options(&self) -> Result<HarvestOptions, HarvestError> {
        Ok(HarvestOptions {
            state: self.pull_request_state()?,
            extension: self.extension.clone(),
            max_rows: self.max,
        })
    }

    /// Builds the GraphQL transport configuration.
    #[must_use]
    pub fn client_config(&self) -> GraphQlClientConfig {
        GraphQlClientConfig::new(self.api_url.clone(), self.retries)
    }

    /// Returns the configured output path or `{owner}-{name}.csv`.
    #[must_use]
    pub fn output_path(&self, locator: &RepositoryLocator) -> Utf8PathBuf {
        self.output.as_deref().map_or_else(
            || Utf8PathBuf::from(locator.default_output_file()),
            Utf8PathBuf::from,
        )
    }
}
