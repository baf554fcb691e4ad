//! Shared translation of pool and Diesel failures into port errors.
//!
//! Adapters supply constructors for their own port error enum, so each port
//! keeps its variant names while the classification stays in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure onto the port's connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Connection-level Diesel failures: the session is gone, not the query.
fn is_connection_failure(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
            | DieselError::BrokenTransactionManager
    )
}

/// Map a Diesel failure onto connection or query errors.
///
/// Use [`unique_violation_details`] first when the caller needs to treat
/// uniqueness violations separately.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
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

    if is_connection_failure(&error) {
        return connection("database connection error".to_owned());
    }
    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => query("database query error".to_owned()),
        DieselError::DatabaseError(_, info) => query(info.message().to_owned()),
        other => query(other.to_string()),
    }
}

/// Constraint name and message of a uniqueness violation, if `error` is one.
pub(crate) fn unique_violation_details(error: &DieselError) -> Option<(Option<&str>, &str)> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some((info.constraint_name(), info.message()))
        }
        _ => None,
    }
}
