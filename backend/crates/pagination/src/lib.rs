//! Opaque cursor and pagination envelope primitives.
//!
//! List endpoints page through ordered result sets with keyset cursors. The
//! cursor key is any serde type (for example `(submitted_at, id)`), encoded as
//! URL-safe base64 JSON so clients treat it as an opaque token.
//!
//! ```
//! use pagination::{Cursor, PageParams};
//!
//! let cursor = Cursor::new(("2026-01-02T03:04:05Z".to_owned(), 7_u32));
//! let token = cursor.encode().expect("cursor encodes");
//! let params = PageParams::new(Some(token), Some(20)).expect("valid params");
//! assert_eq!(params.limit(), 20);
//! let decoded: Cursor<(String, u32)> = params.cursor().expect("cursor").expect("decodes");
//! assert_eq!(decoded.key().1, 7);
//! ```

mod cursor;
mod envelope;
mod params;

pub use cursor::{Cursor, CursorError};
pub use envelope::{Paginated, PaginationLinks};
pub use params::{DEFAULT_LIMIT, MAX_LIMIT, PageParams, PageParamsError};
