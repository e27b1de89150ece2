//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::expense::ValidationError;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The expense submitted by the client broke one of the validation rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request could not be read, e.g. the body was not a JSON object or
    /// a header was not valid text.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The requested resource was not found.
    #[error("Not found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Something went wrong that no other variant describes, e.g. a request
    /// handler panicked.
    #[error("Unexpected server error")]
    Unexpected,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client for any error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// A human readable description of what went wrong.
    pub error: String,
}

/// The message sent to the client when storage fails.
///
/// The underlying cause is only logged on the server.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal error";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, message) = match self {
            Error::Validation(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            error @ Error::BadRequest(_) => (StatusCode::BAD_REQUEST, error.to_string()),
            error @ Error::NotFound => (StatusCode::NOT_FOUND, error.to_string()),
            error @ Error::Unexpected => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_owned(),
                )
            }
        };

        (status_code, Json(ErrorBody { error: message })).into_response()
    }
}
