//! Request-scoped correlation identifier.
//!
//! The `Trace` middleware assigns a fresh [`TraceId`] to every request and
//! runs the handler inside [`TraceId::scope`]. Errors and log lines read it
//! through [`TraceId::current`].
//!
//! Tokio task-locals are not inherited by spawned tasks. Wrap spawned work
//! (for example the WebSocket pump) in [`TraceId::scope`] to keep correlation.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-request trace identifier held in task-local storage.
///
/// # Examples
/// ```
/// use portal::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// let observed = TraceId::scope(trace_id, async { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The identifier in scope for the current task, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` in scope.
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
