//! Resolve the session user and apply the route guard.
//!
//! Every authenticated handler goes through [`authorize`], which checks the
//! identity-store session and reloads the profile, so sign-out, deactivation
//! and role changes take effect on the next request.

use tracing::debug;

use crate::domain::ports::AccountCommand;
use crate::domain::{AccessDecision, Error, Role, SessionState, User, evaluate};

use super::ApiResult;
use super::session::SessionCookie;

/// Load the signed-in user and check `required_role`.
///
/// Anonymous callers get `401`; callers lacking the role or with a
/// deactivated account get `403`.
pub async fn authorize(
    accounts: &dyn AccountCommand,
    session: &SessionCookie,
    required_role: Option<Role>,
) -> ApiResult<User> {
    let resolved = match (session.user_id()?, session.token()?) {
        (None, None) => SessionState::Anonymous,
        (Some(id), Some(token)) => match accounts.session_user(&token).await? {
            Some(user) if user.id() == &id => SessionState::Authenticated(user),
            Some(user) => {
                debug!(
                    cookie_user = %id,
                    session_user = %user.id(),
                    "session token belongs to another user"
                );
                session.clear();
                SessionState::Anonymous
            }
            None => {
                debug!(user_id = %id, "identity session ended or profile missing");
                session.clear();
                SessionState::Anonymous
            }
        },
        _ => {
            debug!("incomplete session cookie");
            session.clear();
            SessionState::Anonymous
        }
    };

    match evaluate(&resolved, required_role) {
        AccessDecision::Allow => {}
        AccessDecision::RedirectToLogin => return Err(Error::unauthorized("login required")),
        AccessDecision::RedirectToDashboard => {
            return Err(Error::forbidden("insufficient role for this operation"));
        }
        AccessDecision::Pending => {
            return Err(Error::service_unavailable("session is still resolving"));
        }
    }

    let SessionState::Authenticated(user) = resolved else {
        return Err(Error::unauthorized("login required"));
    };
    if !user.is_active() {
        return Err(Error::forbidden("account is deactivated"));
    }
    Ok(user)
}
