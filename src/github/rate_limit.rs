//! Rate limit usage reported alongside GitHub GraphQL responses.
//!
//! Every query issued by this crate selects `rateLimit { limit cost remaining }`
//! so operators can watch quota consumption while a long harvest runs. The
//! report is informational only and is never persisted.

use serde::Deserialize;

/// Quota usage returned with a single GraphQL response.
///
/// # Example
///
/// ```
/// use review_harvest::github::rate_limit::RateLimitReport;
///
/// let report = RateLimitReport::new(5000, 1, 4999);
/// assert!(!report.is_exhausted());
/// assert_eq!(
///     report.to_string(),
///     "API Rate Limit: limit=5000 cost=1 remaining=4999"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitReport {
    /// Maximum points available in the current window.
    limit: u64,
    /// Points charged for this query.
    cost: u64,
    /// Points left in the current window.
    remaining: u64,
}

impl RateLimitReport {
    /// Creates a new rate limit report.
    #[must_use]
    pub const fn new(limit: u64, cost: u64, remaining: u64) -> Self {
        Self {
            limit,
            cost,
            remaining,
        }
    }

    /// Returns the maximum points available in the current window.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns the points charged for the query.
    #[must_use]
    pub const fn cost(&self) -> u64 {
        self.cost
    }

    /// Returns the points left in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns true if the next query of the same cost would be refused.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining < self.cost || self.remaining == 0
    }
}

impl std::fmt::Display for RateLimitReport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "API Rate Limit: limit={} cost={} remaining={}",
            self.limit, self.cost, self.remaining
        )
    }
}
