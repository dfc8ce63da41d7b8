//! `ApplicationChangeFeed` backed by a Tokio broadcast channel.
//!
//! Every subscriber gets its own receiver. A subscriber that falls more than
//! the channel capacity behind skips the missed changes and keeps going;
//! clients reconcile by refetching the list.

use futures_util::stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::domain::ApplicationChange;
use crate::domain::ports::{ApplicationChangeFeed, ChangeSubscription};

/// Changes buffered per subscriber before older ones are dropped.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Fan-out of application changes to live subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    sender: broadcast::Sender<ApplicationChange>,
}

impl BroadcastChangeFeed {
    /// Create a feed buffering up to `capacity` changes per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ApplicationChangeFeed for BroadcastChangeFeed {
    fn publish(&self, change: ApplicationChange) {
        let id = *change.application.id();
        match self.sender.send(change) {
            Ok(receivers) => debug!(application_id = %id, receivers, "published change"),
            Err(_) => debug!(application_id = %id, "no subscribers for change"),
        }
    }

    fn subscribe(&self) -> ChangeSubscription {
        let receiver = self.sender.subscribe();
        let changes = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => return Some((change, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change subscriber lagged; skipping ahead");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        ChangeSubscription::new(Box::pin(changes))
    }

    fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeKind;
    use crate::test_support::applications::pending_for;
    use crate::test_support::clock::fixture_timestamp;
    use crate::test_support::users::resident;
    use rstest::rstest;

    fn change(tracking: &str) -> ApplicationChange {
        ApplicationChange::inserted(pending_for(&resident(), tracking, fixture_timestamp()))
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_receive_later_changes() {
        let feed = BroadcastChangeFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(change("BA00000001AAAA"));

        for subscription in [&mut first, &mut second] {
            let received = subscription.next().await.expect("change delivered");
            assert_eq!(received.kind, ChangeKind::Inserted);
            assert_eq!(received.application.tracking_number().as_str(), "BA00000001AAAA");
        }
    }

    #[rstest]
    fn dropping_a_subscription_unsubscribes() {
        let feed = BroadcastChangeFeed::default();
        let subscription = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[rstest]
    fn publishing_without_subscribers_is_harmless() {
        let feed = BroadcastChangeFeed::default();
        feed.publish(change("BA00000001AAAA"));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn lagging_subscribers_skip_to_the_newest_changes() {
        let feed = BroadcastChangeFeed::new(1);
        let mut subscription = feed.subscribe();

        feed.publish(change("BA00000001AAAA"));
        feed.publish(change("BA00000002AAAA"));

        let received = subscription.next().await.expect("newest change kept");
        assert_eq!(received.application.tracking_number().as_str(), "BA00000002AAAA");
    }

    #[rstest]
    #[tokio::test]
    async fn dropping_the_feed_ends_subscriptions() {
        let feed = BroadcastChangeFeed::default();
        let mut subscription = feed.subscribe();
        drop(feed);
        assert!(subscription.next().await.is_none());
    }
}
