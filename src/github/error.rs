//! Error types exposed by the harvesting pipeline.

use thiserror::Error;

/// Errors surfaced while configuring, querying GitHub, or writing rows.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarvestError {
    /// No repository owner and name were supplied.
    #[error("repository owner and name are required: review-harvest <owner> <name>")]
    MissingRepository,

    /// An unsupported CLI argument was supplied.
    #[error("unrecognised argument: {argument}")]
    InvalidArgument {
        /// The flag or value that the CLI does not accept.
        argument: String,
    },

    /// The authentication token was missing.
    #[error("GitHub token is required (use --token, REVIEW_HARVEST_TOKEN, or GITHUB_TOKEN)")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-success HTTP status.
    #[error("GitHub API error: {message}")]
    Api {
        /// Status and response body describing the failure.
        message: String,
    },

    /// The GraphQL endpoint answered with query errors.
    #[error("GraphQL query failed: {message}")]
    GraphQl {
        /// Error messages reported by the endpoint, joined with `; `.
        message: String,
    },

    /// The GraphQL endpoint reported that the rate limit is exhausted.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Error message from GitHub.
        message: String,
    },

    /// The response did not have the shape the query asked for.
    #[error("unexpected GitHub response: {message}")]
    UnexpectedResponse {
        /// Which part of the response was missing or malformed.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Reading or writing CSV records failed.
    #[error("{message}")]
    Csv {
        /// Error detail from the CSV reader or writer, which already names
        /// the CSV stage that failed.
        message: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}

impl From<std::io::Error> for HarvestError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for HarvestError {
    fn from(error: csv::Error) -> Self {
        if let csv::ErrorKind::Io(io_error) = error.kind() {
            return Self::Io {
                message: io_error.to_string(),
            };
        }
        Self::Csv {
            message: error.to_string(),
        }
    }
}
