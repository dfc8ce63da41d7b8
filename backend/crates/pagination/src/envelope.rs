//! Response envelope for paginated collections.

use serde::{Deserialize, Serialize};
use url::Url;

const CURSOR_PARAM: &str = "cursor";
const LIMIT_PARAM: &str = "limit";

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// Link reproducing the current page.
    #[serde(rename = "self")]
    pub self_: String,
    /// Link to the following page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// Build links from the request URL.
    ///
    /// Existing query parameters are preserved; `cursor` and `limit` are
    /// replaced.
    ///
    /// ```
    /// use pagination::PaginationLinks;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://portal.example/api/v1/applications?status=pending")
    ///     .expect("url");
    /// let links = PaginationLinks::from_request(&url, 10, Some("abc"));
    /// assert_eq!(
    ///     links.next.as_deref(),
    ///     Some("https://portal.example/api/v1/applications?status=pending&limit=10&cursor=abc"),
    /// );
    /// ```
    #[must_use]
    pub fn from_request(url: &Url, limit: usize, next_cursor: Option<&str>) -> Self {
        let current_cursor = url
            .query_pairs()
            .find(|(key, _)| key == CURSOR_PARAM)
            .map(|(_, value)| value.into_owned());
        Self {
            self_: with_page(url, limit, current_cursor.as_deref()),
            next: next_cursor.map(|cursor| with_page(url, limit, Some(cursor))),
        }
    }
}

fn with_page(url: &Url, limit: usize, cursor: Option<&str>) -> String {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != CURSOR_PARAM && key != LIMIT_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut target = url.clone();
    {
        let mut pairs = target.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
        if let Some(cursor) = cursor {
            pairs.append_pair(CURSOR_PARAM, cursor);
        }
    }
    target.to_string()
}

/// Page of items plus the limit used and navigation links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page, in collection order.
    pub data: Vec<T>,
    /// Page size requested.
    pub limit: usize,
    /// Navigation links.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Assemble an envelope.
    #[must_use]
    pub const fn new(data: Vec<T>, limit: usize, links: PaginationLinks) -> Self {
        Self { data, limit, links }
    }

    /// Convert each item, keeping limit and links.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            links: self.links,
        }
    }
}
