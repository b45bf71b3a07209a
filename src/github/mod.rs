//! GitHub GraphQL access for review comment harvesting.
//!
//! This module sends authenticated GraphQL queries, walks the paginated
//! pull request connection of a repository and flattens the reviews of each
//! pull request into individual review comments. Errors are mapped into
//! [`HarvestError`] variants so callers can report precise failures.

pub mod error;
pub mod graphql;
pub mod locator;
pub mod models;
pub mod pagination;
pub mod pull_requests;
pub mod rate_limit;
pub mod review_comments;

pub use error::HarvestError;
pub use graphql::{
    GraphQlClientConfig, GraphQlRequest, GraphQlTransport, Query, QueryExecutor, QueryResponse,
    RemoteSchema, ReqwestTransport,
};
pub use locator::{PersonalAccessToken, RepositoryLocator, RepositoryName, RepositoryOwner};
pub use models::{PullRequestSummary, ReviewComment};
pub use pagination::Page;
pub use pull_requests::{PullRequestState, PullRequests, fetch_pull_request_page};
pub use rate_limit::RateLimitReport;
pub use review_comments::{ReviewComments, fetch_review_comments};

#[cfg(test)]
pub use graphql::MockGraphQlTransport;
