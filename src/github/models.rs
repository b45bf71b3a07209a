//! Data models decoded from GitHub GraphQL responses.

use serde::Deserialize;

use super::pagination::ApiPageInfo;

/// Pull request number and how many reviews it has received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestSummary {
    /// Pull request number.
    pub number: u64,
    /// Total number of submitted reviews.
    pub review_count: u64,
}

impl PullRequestSummary {
    /// Returns true if at least one review was submitted.
    #[must_use]
    pub const fn is_reviewed(&self) -> bool {
        self.review_count > 0
    }
}

/// Inline review comment attached to a file in a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    /// Opaque GraphQL node identifier.
    pub id: String,
    /// Path of the file the comment is attached to.
    pub path: String,
    /// Comment text.
    pub body: String,
}

impl ReviewComment {
    /// Returns true if the commented file path ends with `suffix`.
    ///
    /// An empty suffix matches every path.
    #[must_use]
    pub fn path_ends_with(&self, suffix: &str) -> bool {
        self.path.ends_with(suffix)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiTotalCount {
    pub(super) total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestNode {
    pub(super) number: u64,
    pub(super) reviews: ApiTotalCount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiPullRequestConnection {
    pub(super) nodes: Vec<ApiPullRequestNode>,
    pub(super) page_info: ApiPageInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReviewCommentNode {
    pub(super) id: String,
    pub(super) path: String,
    pub(super) body: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiReviewCommentConnection {
    pub(super) total_count: u64,
    pub(super) nodes: Vec<ApiReviewCommentNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReviewNode {
    pub(super) id: String,
    pub(super) comments: ApiReviewCommentConnection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ApiReviewConnection {
    pub(super) total_count: u64,
    pub(super) nodes: Vec<ApiReviewNode>,
}

impl From<ApiPullRequestNode> for PullRequestSummary {
    fn from(value: ApiPullRequestNode) -> Self {
        Self {
            number: value.number,
            review_count: value.reviews.total_count,
        }
    }
}

impl From<ApiReviewCommentNode> for ReviewComment {
    fn from(value: ApiReviewCommentNode) -> Self {
        Self {
            id: value.id,
            path: value.path,
            body: value.body,
        }
    }
}
