//! Lazy enumeration of a repository's pull requests.
//!
//! [`PullRequests`] walks the `pullRequests` connection 100 nodes at a time,
//! fetching the next page only once the previous one has been drained.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::HarvestError;
use super::graphql::{GraphQlTransport, Query, QueryExecutor};
use super::locator::RepositoryLocator;
use super::models::{ApiPullRequestConnection, PullRequestSummary};
use super::pagination::Page;

/// Nodes requested per page.
pub const PAGE_SIZE: u32 = 100;

const GET_PULL_REQUESTS: Query = Query::new(
    "GetPullRequests",
    r"
    query GetPullRequests($owner: String!, $name: String!, $after: String!, $size: Int!, $status: PullRequestState!) {
      repository(owner: $owner, name: $name) {
        pullRequests(first: $size, after: $after, states: [$status]) {
          nodes {
            number
            reviews {
              totalCount
            }
          }
          pageInfo {
            endCursor
            hasNextPage
          }
        }
      }
      rateLimit {
        limit
        cost
        remaining
      }
    }
    ",
);

/// Pull request state filter applied server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestState {
    /// Pull requests that are still open.
    Open,
    /// Pull requests closed without merging.
    Closed,
    /// Pull requests that were merged.
    #[default]
    Merged,
}

impl PullRequestState {
    /// Returns the GraphQL enum value for this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Merged => "MERGED",
        }
    }
}

impl FromStr for PullRequestState {
    type Err = HarvestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "MERGED" => Ok(Self::Merged),
            _ => Err(HarvestError::Configuration {
                message: format!(
                    "unsupported pull request state '{value}' (expected OPEN, CLOSED, or MERGED)"
                ),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct PullRequestsVariables<'a> {
    owner: &'a str,
    name: &'a str,
    after: &'a str,
    size: u32,
    status: PullRequestState,
}

#[derive(Debug, Deserialize)]
struct PullRequestsData {
    repository: Option<PullRequestsRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestsRepository {
    pull_requests: ApiPullRequestConnection,
}

/// Fetches one page of pull requests in `state`, starting after `after`.
///
/// An empty `after` requests the first page.
///
/// # Errors
///
/// Propagates query failures and returns
/// [`HarvestError::UnexpectedResponse`] when the repository is missing from
/// the response.
pub fn fetch_pull_request_page<T: GraphQlTransport>(
    executor: &QueryExecutor<T>,
    locator: &RepositoryLocator,
    state: PullRequestState,
    after: &str,
) -> Result<Page<PullRequestSummary>, HarvestError> {
    let variables = PullRequestsVariables {
        owner: locator.owner().as_str(),
        name: locator.name().as_str(),
        after,
        size: PAGE_SIZE,
        status: state,
    };
    let response = executor.execute::<_, PullRequestsData>(&GET_PULL_REQUESTS, &variables)?;
    let connection = response
        .data
        .repository
        .ok_or_else(|| HarvestError::UnexpectedResponse {
            message: format!("repository {locator} was not returned"),
        })?
        .pull_requests;

    Ok(Page::new(
        connection.nodes.into_iter().map(Into::into).collect(),
        connection.page_info.end_cursor,
        connection.page_info.has_next_page,
    ))
}

/// Iterator over every pull request of a repository in one state.
///
/// Each call to `next` either yields a buffered summary or blocks on one page
/// fetch. After an error has been yielded the iterator is exhausted.
pub struct PullRequests<'a, T> {
    executor: &'a QueryExecutor<T>,
    locator: &'a RepositoryLocator,
    state: PullRequestState,
    buffer: std::vec::IntoIter<PullRequestSummary>,
    next_cursor: Option<String>,
    pages_fetched: u64,
}

impl<'a, T: GraphQlTransport> PullRequests<'a, T> {
    /// Starts enumeration from the first page.
    #[must_use]
    pub fn new(
        executor: &'a QueryExecutor<T>,
        locator: &'a RepositoryLocator,
        state: PullRequestState,
    ) -> Self {
        Self::starting_after(executor, locator, state, String::new())
    }

    /// Resumes enumeration from a cursor returned by an earlier page.
    #[must_use]
    pub fn starting_after(
        executor: &'a QueryExecutor<T>,
        locator: &'a RepositoryLocator,
        state: PullRequestState,
        cursor: String,
    ) -> Self {
        Self {
            executor,
            locator,
            state,
            buffer: Vec::new().into_iter(),
            next_cursor: Some(cursor),
            pages_fetched: 0,
        }
    }

    /// Number of pages fetched so far.
    #[must_use]
    pub const fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }
}

impl<T: GraphQlTransport> Iterator for PullRequests<'_, T> {
    type Item = Result<PullRequestSummary, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(summary) = self.buffer.next() {
                return Some(Ok(summary));
            }

            let cursor = self.next_cursor.take()?;
            let page =
                match fetch_pull_request_page(self.executor, self.locator, self.state, &cursor)
                    .and_then(Page::into_parts)
                {
                    Ok(parts) => parts,
                    Err(error) => return Some(Err(error)),
                };
            self.pages_fetched += 1;

            let (items, next_cursor) = page;
            tracing::debug!(
                repository = %self.locator,
                page = self.pages_fetched,
                pull_requests = items.len(),
                has_next = next_cursor.is_some(),
                "fetched pull request page"
            );
            self.buffer = items.into_iter();
            self.next_cursor = next_cursor;
        }
    }
}
