//! Errors returned by the account and application services.
//!
//! Both enums convert into the transport-agnostic [`Error`] so inbound
//! adapters can return them with `?`.

use serde_json::json;

use super::{AccountValidationError, ApplicationValidationError, Error, TransitionError};

/// Failures of session and account operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Credentials were refused or the profile could not be loaded.
    #[error("{message}")]
    Auth {
        /// Message from the identity store or profile lookup.
        message: String,
    },
    /// Registration could not create the account.
    #[error("{message}")]
    Registration {
        /// Reason, e.g. a duplicate email.
        message: String,
    },
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] AccountValidationError),
    /// A backing store failed.
    #[error("{message}")]
    Storage {
        /// Adapter message.
        message: String,
        /// The store was unreachable rather than broken.
        transient: bool,
    },
}

impl SessionError {
    /// Authentication failure.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Registration failure.
    pub fn registration(message: impl Into<String>) -> Self {
        Self::Registration {
            message: message.into(),
        }
    }

    /// Permanent storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: false,
        }
    }

    /// Storage temporarily unreachable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: true,
        }
    }
}

impl From<SessionError> for Error {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Auth { message } => Error::unauthorized(message),
            SessionError::Registration { message } => Error::conflict(message),
            SessionError::Validation(err) => Error::invalid_request(err.to_string())
                .with_details(json!({ "field": err.field(), "code": err.code() })),
            SessionError::Storage {
                message,
                transient: true,
            } => Error::service_unavailable(message),
            SessionError::Storage { message, .. } => Error::internal(message),
        }
    }
}

/// Failures of application lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The acting user may not perform the operation.
    #[error("{message}")]
    Authorization {
        /// Explanation for the caller.
        message: String,
    },
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ApplicationValidationError),
    /// The application does not exist or is not visible to the caller.
    #[error("application {reference} not found")]
    NotFound {
        /// Identifier or tracking number that was looked up.
        reference: String,
    },
    /// The status graph forbids the transition.
    #[error(transparent)]
    InvalidStateTransition(#[from] TransitionError),
    /// A rejection was attempted without a reason.
    #[error("a rejection reason is required")]
    MissingReason,
    /// A backing store failed.
    #[error("{message}")]
    Storage {
        /// Adapter message.
        message: String,
        /// The store was unreachable rather than broken.
        transient: bool,
    },
}

impl LifecycleError {
    /// Authorization failure.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Missing or hidden application.
    pub fn not_found(reference: impl ToString) -> Self {
        Self::NotFound {
            reference: reference.to_string(),
        }
    }

    /// Permanent storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: false,
        }
    }

    /// Storage temporarily unreachable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            transient: true,
        }
    }
}

impl From<LifecycleError> for Error {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::Authorization { message } => Error::forbidden(message),
            LifecycleError::Validation(err) => {
                let mut details = json!({ "field": err.field(), "code": err.code() });
                if let Some(index) = err.index() {
                    details["index"] = json!(index);
                }
                Error::invalid_request(err.to_string()).with_details(details)
            }
            LifecycleError::NotFound { reference } => {
                Error::not_found(format!("application {reference} not found"))
            }
            LifecycleError::InvalidStateTransition(err) => Error::conflict(err.to_string())
                .with_details(json!({
                    "code": "invalid_state_transition",
                    "from": err.from.as_str(),
                    "to": err.to.as_str(),
                })),
            LifecycleError::MissingReason => {
                Error::invalid_request("a rejection reason is required").with_details(json!({
                    "field": "rejectionReason",
                    "code": "missing_reason",
                }))
            }
            LifecycleError::Storage {
                message,
                transient: true,
            } => Error::service_unavailable(message),
            LifecycleError::Storage { message, .. } => Error::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationStatus, ErrorCode};
    use rstest::rstest;

    #[rstest]
    fn missing_reason_is_an_invalid_request_with_code() {
        let err = Error::from(LifecycleError::MissingReason);
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(
            err.details().and_then(|d| d.get("code")),
            Some(&json!("missing_reason"))
        );
    }

    #[rstest]
    fn transition_errors_are_conflicts() {
        let err = Error::from(LifecycleError::from(TransitionError::new(
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        )));
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(
            err.details().and_then(|d| d.get("from")),
            Some(&json!("approved"))
        );
    }

    #[rstest]
    fn attachment_errors_carry_index() {
        let err = Error::from(LifecycleError::Validation(
            ApplicationValidationError::EmptyAttachment { index: 2 },
        ));
        assert_eq!(err.details().and_then(|d| d.get("index")), Some(&json!(2)));
    }

    #[rstest]
    #[case(SessionError::auth("Invalid login credentials"), ErrorCode::Unauthorized)]
    #[case(SessionError::registration("User already registered"), ErrorCode::Conflict)]
    #[case(SessionError::Validation(AccountValidationError::PasswordMismatch), ErrorCode::InvalidRequest)]
    #[case(SessionError::unavailable("timeout"), ErrorCode::ServiceUnavailable)]
    #[case(SessionError::storage("disk full"), ErrorCode::InternalError)]
    fn session_errors_map_to_codes(#[case] err: SessionError, #[case] code: ErrorCode) {
        assert_eq!(Error::from(err).code(), code);
    }
}
