//! Transport-agnostic portal errors.
//!
//! Services return [`Error`]; inbound adapters turn it into HTTP responses or
//! WebSocket close frames. The trace identifier in scope when the error is
//! built is captured automatically so responses correlate with logs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TraceId;

/// Header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with the current state of the resource.
    Conflict,
    /// A backing service is temporarily unavailable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the portal.
    InternalError,
}

/// Error payload shared by every adapter.
///
/// ## Invariants
/// - `message` is non-empty once trimmed.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use portal::domain::{Error, ErrorCode};
///
/// let err = Error::conflict("application is no longer pending");
/// assert_eq!(err.code(), ErrorCode::Conflict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

/// Validation errors raised by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorValidationError {
    /// The message was blank.
    EmptyMessage,
    /// The trace identifier was blank.
    EmptyTraceId,
}

impl std::fmt::Display for ErrorValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "error message must not be empty"),
            Self::EmptyTraceId => write!(f, "trace identifier must not be empty"),
        }
    }
}

impl std::error::Error for ErrorValidationError {}

impl Error {
    /// Create a new error, panicking if the message is blank.
    ///
    /// Constructors in this crate only pass literal or formatted messages, so
    /// the panic marks a programming error rather than bad input.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor capturing the trace identifier in scope.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier, if one was in scope or attached.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary structured details.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details.
    ///
    /// # Examples
    /// ```
    /// use portal::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("purpose too short")
    ///     .with_details(json!({ "field": "purpose" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach a trace identifier, panicking when blank.
    pub fn with_trace_id(self, trace_id: impl Into<String>) -> Self {
        match self.try_with_trace_id(trace_id) {
            Ok(value) => value,
            Err(err) => panic!("trace identifiers must satisfy validation: {err}"),
        }
    }

    /// Attach a trace identifier, rejecting blank values.
    pub fn try_with_trace_id(
        mut self,
        trace_id: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        self.trace_id = Some(trace_id);
        Ok(self)
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            trace_id,
            details,
        } = value;
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        // Payloads carry their own correlation; never adopt the ambient one.
        let mut error = Self {
            code,
            message,
            trace_id: None,
            details,
        };
        if let Some(trace_id) = trace_id {
            error = error.try_with_trace_id(trace_id)?;
        }
        Ok(error)
    }
}
