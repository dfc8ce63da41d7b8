//! Validated page request parameters.

use serde::de::DeserializeOwned;

use crate::cursor::{Cursor, CursorError};

/// Page size used when the client does not ask for one.
pub const DEFAULT_LIMIT: usize = 10;
/// Largest page size a client may request.
pub const MAX_LIMIT: usize = 50;

/// Validation failures for [`PageParams`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PageParamsError {
    /// The requested limit is outside `1..=MAX_LIMIT`.
    #[error("limit must be between 1 and {max}, got {value}")]
    LimitOutOfRange {
        /// Rejected value.
        value: usize,
        /// Upper bound.
        max: usize,
    },
    /// The cursor token is blank.
    #[error("cursor must not be blank")]
    BlankCursor,
}

/// Page request: optional opaque cursor plus a bounded limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    cursor: Option<String>,
    limit: usize,
}

impl PageParams {
    /// Validate raw query values.
    ///
    /// # Errors
    ///
    /// Returns [`PageParamsError`] for an out-of-range limit or a blank cursor.
    pub fn new(cursor: Option<String>, limit: Option<usize>) -> Result<Self, PageParamsError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageParamsError::LimitOutOfRange {
                value: limit,
                max: MAX_LIMIT,
            });
        }
        if cursor.as_deref().is_some_and(|token| token.trim().is_empty()) {
            return Err(PageParamsError::BlankCursor);
        }
        Ok(Self { cursor, limit })
    }

    /// First page with the default limit.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Requested page size.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Raw cursor token, if any.
    #[must_use]
    pub fn cursor_token(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Decode the cursor token into a typed key.
    ///
    /// Returns `None` for the first page.
    #[must_use]
    pub fn cursor<K: DeserializeOwned>(&self) -> Option<Result<Cursor<K>, CursorError>> {
        self.cursor.as_deref().map(Cursor::decode)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::first()
    }
}
