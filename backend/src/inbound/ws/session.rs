//! Per-connection live-update loop.
//!
//! The server pings every 5s and drops a client after 10s without any
//! traffic from it. Changes outside the user's visibility scope are never
//! sent. The channel is server-push only: a text or binary frame from the
//! client closes it with a policy violation.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::{debug, info, warn};

use crate::domain::ports::ChangeSubscription;
use crate::domain::{ApplicationChange, ApplicationScope, User};

use super::messages::ApplicationEventMessage;

#[cfg(not(test))]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub(super) const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(not(test))]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
pub(super) const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

enum Shutdown {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    FeedClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    UnexpectedPayload,
    Network(Closed),
}

impl Shutdown {
    fn close_reason(&self) -> Option<Option<CloseReason>> {
        let reason = |code, description: &str| {
            Some(Some(CloseReason {
                code,
                description: Some(description.to_owned()),
            }))
        };
        match self {
            Self::HeartbeatTimeout => reason(CloseCode::Normal, "heartbeat timeout"),
            Self::Protocol(_) => reason(CloseCode::Protocol, "protocol error"),
            Self::UnexpectedPayload => reason(CloseCode::Policy, "server-push only"),
            Self::FeedClosed => reason(CloseCode::Away, "server shutting down"),
            Self::ClientClosed(reason) => Some(reason.clone()),
            Self::StreamClosed | Self::Network(_) => None,
        }
    }

    fn log(&self, user: &User) {
        match self {
            Self::HeartbeatTimeout => warn!(user_id = %user.id(), "live socket heartbeat timeout"),
            Self::Protocol(error) => warn!(user_id = %user.id(), %error, "live socket protocol error"),
            Self::Network(error) => warn!(user_id = %user.id(), %error, "live socket send failed"),
            Self::UnexpectedPayload => {
                warn!(user_id = %user.id(), "client sent data on a server-push socket");
            }
            Self::FeedClosed | Self::ClientClosed(_) | Self::StreamClosed => {
                debug!(user_id = %user.id(), "live socket closed");
            }
        }
    }
}

/// Live-update connection for one signed-in user.
pub(super) struct LiveSession {
    user: User,
    scope: ApplicationScope,
    subscription: ChangeSubscription,
}

impl LiveSession {
    pub(super) fn new(user: User, subscription: ChangeSubscription) -> Self {
        let scope = ApplicationScope::for_user(&user);
        Self {
            user,
            scope,
            subscription,
        }
    }

    pub(super) async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        info!(user_id = %self.user.id(), "live socket opened");
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        let shutdown = loop {
            let step = tokio::select! {
                _ = heartbeat.tick() => {
                    if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
                        Err(Shutdown::HeartbeatTimeout)
                    } else {
                        session.ping(b"").await.map_err(Shutdown::Network)
                    }
                }
                message = stream.recv() => {
                    Self::handle_client_message(&mut session, &mut last_heartbeat, message).await
                }
                change = self.subscription.next() => match change {
                    Some(change) => self.forward(&mut session, &change).await,
                    None => Err(Shutdown::FeedClosed),
                },
            };
            if let Err(shutdown) = step {
                break shutdown;
            }
        };

        shutdown.log(&self.user);
        if let Some(reason) = shutdown.close_reason() {
            if let Err(error) = session.close(reason).await {
                debug!(%error, "live socket already closed");
            }
        }
    }

    async fn handle_client_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), Shutdown> {
        let message = match message {
            None => return Err(Shutdown::StreamClosed),
            Some(Err(error)) => return Err(Shutdown::Protocol(error)),
            Some(Ok(message)) => message,
        };
        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(Shutdown::Network),
            Message::Pong(_) | Message::Nop => Ok(()),
            Message::Text(_) | Message::Binary(_) | Message::Continuation(_) => {
                Err(Shutdown::UnexpectedPayload)
            }
            Message::Close(reason) => Err(Shutdown::ClientClosed(reason)),
        }
    }

    async fn forward(
        &self,
        session: &mut Session,
        change: &ApplicationChange,
    ) -> Result<(), Shutdown> {
        if !self.scope.permits(&change.application) {
            return Ok(());
        }
        let message = ApplicationEventMessage::from(change);
        match serde_json::to_string(&message) {
            Ok(body) => session.text(body).await.map_err(Shutdown::Network),
            Err(error) => {
                warn!(%error, "failed to serialise application change");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
