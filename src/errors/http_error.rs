use std::{borrow::Cow, fmt::Debug, ops::Deref};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use error_stack::Report;
use serde::Serialize;
use tracing::{event, Level};

/// An error that can be returned from an HTTP endpoint
pub trait HttpError: ToString + std::fmt::Debug {
    /// The status code that the error should return.
    fn status_code(&self) -> StatusCode;

    /// A stable code that tells clients what kind of failure occurred.
    fn error_kind(&self) -> &'static str;

    /// Extra detail about this error
    fn error_detail(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// The status code and body for this error.
    fn response_tuple(&self) -> (StatusCode, ErrorResponseData) {
        (
            self.status_code(),
            ErrorResponseData::new(self.error_kind(), self.to_string(), self.error_detail()),
        )
    }

    /// Convert the error into a [Response].
    fn to_response(&self) -> Response {
        let (code, json) = self.response_tuple();
        (code, Json(json)).into_response()
    }
}

impl<T> HttpError for Report<T>
where
    T: HttpError + Send + Sync + 'static,
{
    fn status_code(&self) -> StatusCode {
        self.current_context().status_code()
    }

    fn error_kind(&self) -> &'static str {
        self.current_context().error_kind()
    }

    /// Context-specific detail if the error has any, otherwise the whole report.
    fn error_detail(&self) -> serde_json::Value {
        match self.current_context().error_detail() {
            serde_json::Value::Null if self.status_code().is_server_error() => {
                serde_json::Value::String(format!("{self:?}"))
            }
            detail => detail,
        }
    }
}

/// A body to be returned in an error response
#[derive(Debug, Serialize)]
pub struct ErrorResponseData {
    error: ErrorDetails,
}

/// An error code and additional details.
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    kind: Cow<'static, str>,
    message: Cow<'static, str>,
    details: serde_json::Value,
}

impl ErrorResponseData {
    /// Create a new [ErrorResponseData] with the given error code and message.
    pub fn new(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
        details: serde_json::Value,
    ) -> ErrorResponseData {
        let ret = ErrorResponseData {
            error: ErrorDetails {
                kind: kind.into(),
                message: message.into(),
                details,
            },
        };

        event!(Level::ERROR, kind=%ret.error.kind, message=%ret.error.message, details=%ret.error.details);

        ret
    }
}

/// Wraps an error_stack::Report and implements IntoResponse, so that endpoints can return a
/// `Report<T>` with `?`.
pub struct WrapReport<T: HttpError + Sync + Send + 'static>(Report<T>);

impl<T: HttpError + Sync + Send + 'static> IntoResponse for WrapReport<T> {
    fn into_response(self) -> Response {
        self.0.to_response()
    }
}

impl<T: HttpError + Sync + Send + 'static> From<Report<T>> for WrapReport<T> {
    fn from(value: Report<T>) -> Self {
        WrapReport(value)
    }
}

impl<T: HttpError + std::error::Error + Sync + Send + 'static> From<T> for WrapReport<T> {
    fn from(value: T) -> Self {
        WrapReport(Report::from(value))
    }
}

impl<T: HttpError + Sync + Send + 'static> Deref for WrapReport<T> {
    type Target = Report<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
