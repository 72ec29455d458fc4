//! Shared error mapping and transaction plumbing for the Diesel repositories.
//!
//! Every port error enum exposes `connection` and `query` constructors (see
//! `define_port_error!`), so the mappers here take those constructors as
//! closures instead of naming a concrete error type.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// PostgreSQL reports SQLSTATE 40P01 with this message; Diesel has no kind
/// for it.
const DEADLOCK_MESSAGE: &str = "deadlock detected";

/// Map a pool failure onto a port's `connection` constructor.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map the Diesel failures every repository treats alike.
///
/// Closed connections and transactions PostgreSQL aborted to break a
/// deadlock or serialization conflict become `connection`, which callers may
/// retry. Everything else becomes `query`. Callers match constraint
/// violations they care about before falling back to this.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            connection("database busy, retry the request")
        }
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
            if info.message().starts_with(DEADLOCK_MESSAGE) =>
        {
            connection("database busy, retry the request")
        }
        _ => query("database error"),
    }
}

/// Name of the unique constraint a write tripped, if that is what failed.
pub(crate) fn unique_violation(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Whether a write tripped a foreign key.
pub(crate) fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Convert loaded rows, mapping the first invalid row through `map_err`.
pub(crate) fn collect_rows<R, T, E>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, String>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    rows.into_iter()
        .map(convert)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)
}

/// Error type used inside `AsyncConnection::transaction` closures.
///
/// Diesel needs `From<diesel::result::Error>` to roll back on query failures;
/// `Port` carries a domain-level refusal out of the transaction, which also
/// rolls it back.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(DieselError),
    Port(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl<E> TxError<E> {
    /// Collapse into the port error, mapping Diesel failures with `map`.
    pub(crate) fn into_port(self, map: impl FnOnce(DieselError) -> E) -> E {
        match self {
            Self::Diesel(error) => map(error),
            Self::Port(error) => error,
        }
    }
}
