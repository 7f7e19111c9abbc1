use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{admin::form::FormErrors, errors::HttpError};

/// The top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to start the HTTP server
    #[error("Failed to start server")]
    ServerStart,
    /// Failed to initialize tracing
    #[error("Failed to configure tracing")]
    TracingConfig,
    /// The persistence layer returned an error
    #[error("Persistence error")]
    Db,
    /// The object permission registry returned an error
    #[error("Object permission error")]
    Permissions,
    /// Failed to append to the audit trail
    #[error("Event log error")]
    EventLog,
    /// Failed to write to the admin history
    #[error("Admin history error")]
    AdminHistory,
    /// Failed to read or write an image file
    #[error("Storage error")]
    Storage,
    /// The notification subsystem failed to deliver a notice
    #[error("Notification error")]
    Notification,
    /// The requested object does not exist
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The submitted form failed validation
    #[error("Invalid form submission")]
    Validation(FormErrors),
    /// The user is logged in, but may not perform this action
    #[error("Permission denied")]
    Forbidden,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        self.to_response()
    }
}

impl HttpError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::ServerStart
            | Error::TracingConfig
            | Error::Db
            | Error::Permissions
            | Error::EventLog
            | Error::AdminHistory
            | Error::Storage
            | Error::Notification => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            Error::ServerStart => "server",
            Error::TracingConfig => "tracing",
            Error::Db => "db",
            Error::Permissions => "permissions",
            Error::EventLog => "event_log",
            Error::AdminHistory => "admin_history",
            Error::Storage => "storage",
            Error::Notification => "notification",
            Error::NotFound(_) => "not_found",
            Error::Validation(_) => "validation",
            Error::Forbidden => "forbidden",
        }
    }

    fn error_detail(&self) -> serde_json::Value {
        match self {
            Error::Validation(errors) => serde_json::to_value(errors).unwrap_or_default(),
            _ => serde_json::Value::Null,
        }
    }
}
