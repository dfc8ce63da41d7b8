//! In-process application change notification.

mod broadcast;

pub use broadcast::{BroadcastChangeFeed, DEFAULT_FEED_CAPACITY};
