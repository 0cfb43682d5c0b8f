//! Unified error types and result handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

/// Every failure the crate reports, with the HTTP status it maps to.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings or the menu file could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The request or record was rejected; shown to the caller as is
    #[error("{message}")]
    Validation { message: String },

    /// No row with this id
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A foreign key still points at the row
    #[error("Cannot delete or change this record, it is still referenced: {message}")]
    Protected { message: String },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// A demo page failed to render
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// Reading the menu file or binding the listener failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An environment variable was present but unreadable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        // Rejections raised by the entity save hooks, and malformed admin input, carry a
        // user-facing message
        match err {
            DbErr::Custom(message) | DbErr::Json(message) => Self::Validation { message },
            err => match err.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(message)) => Self::Protected { message },
                _ => Self::Database(err),
            },
        }
    }
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Protected { .. } => StatusCode::CONFLICT,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Template(_)
            | Self::Io(_)
            | Self::EnvVar(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
