//! Port for pushing application changes to live subscribers.

use std::fmt;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};

use crate::domain::ApplicationChange;

/// Boxed stream of changes.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ApplicationChange> + Send>>;

/// Live subscription to application changes.
///
/// Dropping the subscription unsubscribes.
pub struct ChangeSubscription {
    stream: ChangeStream,
}

impl ChangeSubscription {
    /// Wrap an adapter stream.
    pub fn new(stream: ChangeStream) -> Self {
        Self { stream }
    }

    /// Wait for the next change; `None` once the feed has shut down.
    pub async fn next(&mut self) -> Option<ApplicationChange> {
        self.stream.next().await
    }
}

impl fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubscription").finish_non_exhaustive()
    }
}

/// Publish/subscribe contract for application inserts and updates.
#[cfg_attr(test, mockall::automock)]
pub trait ApplicationChangeFeed: Send + Sync {
    /// Deliver a change to every current subscriber.
    fn publish(&self, change: ApplicationChange);

    /// Start receiving changes published after this call.
    fn subscribe(&self) -> ChangeSubscription;

    /// Number of live subscriptions.
    fn subscriber_count(&self) -> usize;
}

/// Feed that drops every change; for wiring that has no live clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpChangeFeed;

impl ApplicationChangeFeed for NoOpChangeFeed {
    fn publish(&self, _change: ApplicationChange) {}

    fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription::new(Box::pin(futures_util::stream::empty()))
    }

    fn subscriber_count(&self) -> usize {
        0
    }
}
