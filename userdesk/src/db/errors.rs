use thiserror::Error;

/// Unified error type for the data-access layer.
///
/// Driver failures are never reclassified here: they are wrapped once in [`DbError::Query`]
/// (or surface as [`DbError::Sqlx`] for session-level work) with the original [`sqlx::Error`]
/// kept intact as the source. Deciding what a constraint violation *means* is left to the
/// request-handling layer, which can inspect it through the helpers below.
#[derive(Error, Debug)]
pub enum DbError {
    /// A session or connection was requested before `init` (or after `close`)
    #[error("database session manager is not initialized")]
    Uninitialized,

    /// An entity binding or connection setting is unusable
    #[error("invalid database configuration for {entity}: {reason}")]
    Configuration { entity: String, reason: String },

    /// Criteria or changes referenced a column the entity does not declare
    #[error("{entity} has no field named '{field}'")]
    UnknownField { entity: &'static str, field: String },

    /// Changes tried to write a column owned by the database (identity or timestamps)
    #[error("field '{field}' of {entity} is managed by the database and cannot be written")]
    ReadOnlyField { entity: &'static str, field: String },

    /// A repository operation failed in the driver or in the database
    #[error("failed to {operation} {entity} ({key})")]
    Query {
        entity: &'static str,
        operation: &'static str,
        /// Lookup key or payload summary, for diagnostics
        key: String,
        #[source]
        source: sqlx::Error,
    },

    /// Session-level failure (begin, commit, rollback)
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub(crate) fn query(entity: &'static str, operation: &'static str, key: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Query {
            entity,
            operation,
            key: key.into(),
            source,
        }
    }

    /// The untouched driver error, if this failure came from the driver
    pub fn source_error(&self) -> Option<&sqlx::Error> {
        match self {
            DbError::Query { source, .. } => Some(source),
            DbError::Sqlx(err) => Some(err),
            _ => None,
        }
    }

    fn database_error(&self) -> Option<&dyn sqlx::error::DatabaseError> {
        self.source_error().and_then(|err| err.as_database_error())
    }

    pub fn is_unique_violation(&self) -> bool {
        self.database_error().is_some_and(|e| e.is_unique_violation())
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.database_error().is_some_and(|e| e.is_foreign_key_violation())
    }

    pub fn is_check_violation(&self) -> bool {
        self.database_error().is_some_and(|e| e.is_check_violation())
    }

    /// Postgres `not_null_violation` (SQLSTATE 23502)
    pub fn is_not_null_violation(&self) -> bool {
        self.database_error().and_then(|e| e.code()).is_some_and(|code| code == "23502")
    }

    /// The row an update or refresh expected was not there
    pub fn is_row_not_found(&self) -> bool {
        matches!(self.source_error(), Some(sqlx::Error::RowNotFound))
    }

    /// Constraint name reported by the database, if any
    pub fn constraint(&self) -> Option<&str> {
        self.database_error().and_then(|e| e.constraint())
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn query_error_keeps_driver_error_as_source() {
        let err = DbError::query("User", "get", "id=7", sqlx::Error::RowNotFound);

        assert_eq!(err.to_string(), "failed to get User (id=7)");
        assert!(err.is_row_not_found());
        assert!(err.source().is_some());
        assert!(matches!(err.source_error(), Some(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn non_driver_errors_have_no_constraint_details() {
        let err = DbError::UnknownField {
            entity: "User",
            field: "nickname".to_string(),
        };

        assert!(err.source_error().is_none());
        assert!(!err.is_unique_violation());
        assert!(!err.is_not_null_violation());
        assert!(err.constraint().is_none());
    }

    #[test]
    fn pool_errors_are_not_constraint_violations() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);

        assert!(!err.is_unique_violation());
        assert!(!err.is_check_violation());
        assert!(!err.is_foreign_key_violation());
        assert!(!err.is_row_not_found());
    }
}
