//! Shared Diesel error mapping for the portal repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Name of the unique constraint a Diesel error violated, if any.
pub(super) fn unique_violation(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Map common Diesel failures into query/connection constructors.
///
/// Messages are generic; the Diesel detail is only logged at debug level.
pub(super) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
            query("row violates a table constraint")
        }
        _ => query("database error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Probe {
        Query(String),
        Connection(String),
    }

    fn map(error: DieselError) -> Probe {
        map_diesel_error(
            error,
            |message| Probe::Query(message.to_owned()),
            |message| Probe::Connection(message.to_owned()),
        )
    }

    #[rstest]
    fn not_found_is_a_query_error() {
        assert_eq!(
            map(DieselError::NotFound),
            Probe::Query("record not found".to_owned())
        );
    }

    #[rstest]
    fn closed_connection_is_a_connection_error() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(
            map(error),
            Probe::Connection("database connection error".to_owned())
        );
    }

    #[rstest]
    fn unique_violation_is_detected() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(unique_violation(&error), Some(""));
        assert_eq!(unique_violation(&DieselError::NotFound), None);
    }

    #[rstest]
    fn pool_errors_keep_their_message() {
        let probe = map_pool_error(PoolError::checkout("timed out"), Probe::Connection);
        assert_eq!(probe, Probe::Connection("timed out".to_owned()));
    }
}
