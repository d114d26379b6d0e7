use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::Uninitialized => StatusCode::SERVICE_UNAVAILABLE,
                DbError::UnknownField { .. } | DbError::ReadOnlyField { .. } => StatusCode::BAD_REQUEST,
                e if e.is_unique_violation() => StatusCode::CONFLICT,
                e if e.is_foreign_key_violation() || e.is_check_violation() || e.is_not_null_violation() => {
                    StatusCode::BAD_REQUEST
                }
                e if e.is_row_not_found() => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::Uninitialized => "Database is not available".to_string(),
                // Field names come from the request, so echoing them back is safe
                DbError::UnknownField { .. } | DbError::ReadOnlyField { .. } => db_err.to_string(),
                e if e.is_unique_violation() => "Resource already exists".to_string(),
                e if e.is_foreign_key_violation() => "Invalid reference to related resource".to_string(),
                e if e.is_check_violation() || e.is_not_null_violation() => "Invalid data provided".to_string(),
                e if e.is_row_not_found() => "Resource not found".to_string(),
                _ => "Database error occurred".to_string(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Database(DbError::Uninitialized) => {
                tracing::warn!("Database unavailable: {}", self);
            }
            _ if status.is_server_error() => {
                tracing::error!(error = ?self, "Internal service error: {}", self);
            }
            _ => {
                tracing::warn!(error = ?self, "Database constraint error: {}", self);
            }
        }

        // Unique violations get a minimal structured body naming the violated constraint
        if let Error::Database(db_err) = &self
            && db_err.is_unique_violation()
        {
            let body = json!({
                "message": self.user_message(),
                "constraint": db_err.constraint(),
            });
            return (status, Json(body)).into_response();
        }

        (status, self.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_database_is_service_unavailable() {
        let err = Error::from(DbError::Uninitialized);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.user_message(), "Database is not available");
    }

    #[test]
    fn malformed_field_maps_are_client_errors() {
        let err = Error::from(DbError::ReadOnlyField {
            entity: "User",
            field: "id".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.user_message().contains("'id'"));
    }

    #[test]
    fn vanished_rows_are_not_found() {
        let err = Error::from(DbError::query("User", "update", "id=3", sqlx::Error::RowNotFound));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn driver_failures_do_not_leak_details() {
        let err = Error::from(DbError::query("User", "list", "{}", sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Database error occurred");
    }

    #[test]
    fn configuration_errors_are_internal() {
        let err = Error::from(DbError::Configuration {
            entity: "User".to_string(),
            reason: "table name is empty".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_hide_the_operation() {
        let err = Error::Internal {
            operation: "load signing key".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.to_string(), "Failed to load signing key");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = Error::NotFound {
            resource: "User".to_string(),
            id: "7".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "User with ID 7 not found");
    }
}
