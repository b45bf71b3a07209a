//! Cursor-based pagination state for GitHub GraphQL connections.
//!
//! GraphQL connections report a `pageInfo { endCursor hasNextPage }` block.
//! [`Page`] pairs one batch of decoded items with that block so that
//! enumerators can decide whether, and from where, to continue.

use serde::Deserialize;

use super::error::HarvestError;

/// One batch of items plus the continuation state of its connection.
///
/// # Example
///
/// ```
/// use review_harvest::github::pagination::Page;
///
/// let page = Page::new(vec![1, 2], Some("c1".to_owned()), true);
/// assert_eq!(page.next_cursor().expect("cursor present"), Some("c1"));
///
/// let last = Page::new(vec![3], Some("c2".to_owned()), false);
/// assert_eq!(last.next_cursor().expect("no cursor needed"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    items: Vec<T>,
    end_cursor: Option<String>,
    has_next: bool,
}

impl<T> Page<T> {
    /// Creates a page from its items and connection state.
    #[must_use]
    pub const fn new(items: Vec<T>, end_cursor: Option<String>, has_next: bool) -> Self {
        Self {
            items,
            end_cursor,
            has_next,
        }
    }

    /// Borrows the items on this page.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns true if the connection reported more pages.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Cursor to request the following page with.
    ///
    /// Returns `Ok(None)` on the last page; the cursor is not meaningful once
    /// `has_next` is false.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::UnexpectedResponse`] when the connection claims
    /// a further page but omits the cursor needed to reach it.
    pub fn next_cursor(&self) -> Result<Option<&str>, HarvestError> {
        if !self.has_next {
            return Ok(None);
        }
        self.end_cursor
            .as_deref()
            .map(Some)
            .ok_or_else(|| HarvestError::UnexpectedResponse {
                message: "pageInfo.hasNextPage is true but endCursor is null".to_owned(),
            })
    }

    /// Splits the page into its items and the cursor for the next page.
    ///
    /// # Errors
    ///
    /// See [`Page::next_cursor`].
    pub fn into_parts(self) -> Result<(Vec<T>, Option<String>), HarvestError> {
        let cursor = self.next_cursor()?.map(ToOwned::to_owned);
        Ok((self.items, cursor))
    }
}

/// `pageInfo` selection shared by every paginated connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPageInfo {
    pub(crate) end_cursor: Option<String>,
    pub(crate) has_next_page: bool,
}
