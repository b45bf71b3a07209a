//! Review comment retrieval for pull requests.
//!
//! GitHub nests inline comments under reviews. One query fetches the first
//! 100 reviews of a pull request and the first 100 comments of each review;
//! anything beyond that is not paginated and is dropped with a warning.

use serde::{Deserialize, Serialize};

use super::error::HarvestError;
use super::graphql::{GraphQlTransport, Query, QueryExecutor};
use super::locator::RepositoryLocator;
use super::models::{ApiReviewConnection, ReviewComment};
use super::pull_requests::{PullRequestState, PullRequests};

/// Reviews, and comments per review, requested by one query.
pub const NESTED_PAGE_SIZE: u64 = 100;

const GET_REVIEW_COMMENTS: Query = Query::new(
    "GetPullRequestReviewComments",
    r"
    query GetPullRequestReviewComments($owner: String!, $name: String!, $prNumber: Int!) {
      repository(owner: $owner, name: $name) {
        pullRequest(number: $prNumber) {
          reviews(first: 100) {
            totalCount
            nodes {
              id
              comments(first: 100) {
                totalCount
                nodes {
                  id
                  path
                  body
                }
              }
            }
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewCommentsVariables<'a> {
    owner: &'a str,
    name: &'a str,
    pr_number: u64,
}

#[derive(Debug, Deserialize)]
struct ReviewCommentsData {
    repository: Option<ReviewCommentsRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewCommentsRepository {
    pull_request: Option<ReviewCommentsPullRequest>,
}

#[derive(Debug, Deserialize)]
struct ReviewCommentsPullRequest {
    reviews: ApiReviewConnection,
}

/// Fetches the review comments of one pull request, flattened in review
/// order and then comment order.
///
/// # Errors
///
/// Propagates query failures and returns
/// [`HarvestError::UnexpectedResponse`] when the repository or pull request
/// is missing from the response.
pub fn fetch_review_comments<T: GraphQlTransport>(
    executor: &QueryExecutor<T>,
    locator: &RepositoryLocator,
    number: u64,
) -> Result<Vec<ReviewComment>, HarvestError> {
    let variables = ReviewCommentsVariables {
        owner: locator.owner().as_str(),
        name: locator.name().as_str(),
        pr_number: number,
    };
    let response = executor.execute::<_, ReviewCommentsData>(&GET_REVIEW_COMMENTS, &variables)?;
    let reviews = response
        .data
        .repository
        .and_then(|repository| repository.pull_request)
        .ok_or_else(|| HarvestError::UnexpectedResponse {
            message: format!("pull request {locator}#{number} was not returned"),
        })?
        .reviews;

    if reviews.total_count > NESTED_PAGE_SIZE {
        tracing::warn!(
            pull_request = number,
            reviews = reviews.total_count,
            "only the first {NESTED_PAGE_SIZE} reviews are harvested"
        );
    }

    let comments = reviews
        .nodes
        .into_iter()
        .flat_map(|review| {
            if review.comments.total_count > NESTED_PAGE_SIZE {
                tracing::warn!(
                    pull_request = number,
                    review = review.id.as_str(),
                    comments = review.comments.total_count,
                    "only the first {NESTED_PAGE_SIZE} comments of the review are harvested"
                );
            }
            review.comments.nodes
        })
        .map(ReviewComment::from)
        .collect();
    Ok(comments)
}

/// Iterator over the review comments of every reviewed pull request.
///
/// Pull requests without reviews are skipped without a query. The comments
/// of the next reviewed pull request are fetched only once the previous
/// batch is drained, so dropping the iterator stops all further requests.
pub struct ReviewComments<'a, T> {
    executor: &'a QueryExecutor<T>,
    locator: &'a RepositoryLocator,
    pull_requests: PullRequests<'a, T>,
    buffer: std::vec::IntoIter<ReviewComment>,
    pull_requests_queried: u64,
    finished: bool,
}

impl<'a, T: GraphQlTransport> ReviewComments<'a, T> {
    /// Enumerates comments across all pull requests in `state`.
    #[must_use]
    pub fn new(
        executor: &'a QueryExecutor<T>,
        locator: &'a RepositoryLocator,
        state: PullRequestState,
    ) -> Self {
        Self::from_pull_requests(executor, locator, PullRequests::new(executor, locator, state))
    }

    /// Enumerates comments for the pull requests produced by `pull_requests`.
    #[must_use]
    pub fn from_pull_requests(
        executor: &'a QueryExecutor<T>,
        locator: &'a RepositoryLocator,
        pull_requests: PullRequests<'a, T>,
    ) -> Self {
        Self {
            executor,
            locator,
            pull_requests,
            buffer: Vec::new().into_iter(),
            pull_requests_queried: 0,
            finished: false,
        }
    }

    /// Number of pull requests whose comments were requested so far.
    #[must_use]
    pub const fn pull_requests_queried(&self) -> u64 {
        self.pull_requests_queried
    }
}

impl<T: GraphQlTransport> Iterator for ReviewComments<'_, T> {
    type Item = Result<ReviewComment, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(comment) = self.buffer.next() {
                return Some(Ok(comment));
            }
            if self.finished {
                return None;
            }

            let summary = match self.pull_requests.next()? {
                Ok(summary) => summary,
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            };
            if !summary.is_reviewed() {
                tracing::trace!(pull_request = summary.number, "skipping unreviewed pull request");
                continue;
            }

            match fetch_review_comments(self.executor, self.locator, summary.number) {
                Ok(comments) => {
                    self.pull_requests_queried += 1;
                    tracing::debug!(
                        pull_request = summary.number,
                        comments = comments.len(),
                        "fetched review comments"
                    );
                    self.buffer = comments.into_iter();
                }
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}
