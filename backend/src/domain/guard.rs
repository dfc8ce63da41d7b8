//! Route access decisions.
//!
//! The same evaluation backs the HTTP extractor and any client that holds a
//! [`SessionState`]. While the session is still resolving the answer is
//! [`AccessDecision::Pending`]; callers must not redirect in that state.

use super::{Role, User};

/// Authentication state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Restoration has not finished yet.
    #[default]
    Unresolved,
    /// A user is signed in.
    Authenticated(User),
    /// Nobody is signed in.
    Anonymous,
}

impl SessionState {
    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether restoration is still running.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the protected content.
    Allow,
    /// Send the caller to the login page.
    RedirectToLogin,
    /// Signed in but lacking the role; send to the dashboard.
    RedirectToDashboard,
    /// Session still resolving; show a loading state.
    Pending,
}

/// Decide whether `state` may access a route that optionally requires `role`.
///
/// # Examples
/// ```
/// use portal::domain::{AccessDecision, Role, SessionState, evaluate};
///
/// assert_eq!(evaluate(&SessionState::Unresolved, Some(Role::Admin)), AccessDecision::Pending);
/// assert_eq!(evaluate(&SessionState::Anonymous, None), AccessDecision::RedirectToLogin);
/// ```
pub fn evaluate(state: &SessionState, required_role: Option<Role>) -> AccessDecision {
    match state {
        SessionState::Unresolved => AccessDecision::Pending,
        SessionState::Anonymous => AccessDecision::RedirectToLogin,
        SessionState::Authenticated(user) => match required_role {
            Some(role) if user.role() != role => AccessDecision::RedirectToDashboard,
            _ => AccessDecision::Allow,
        },
    }
}
