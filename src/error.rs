use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

const STORAGE_FAILURE_MESSAGE: &str = "Failed to access budget data. Please try again later.";
const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to generate AI insights. Please try again.";

/// Failure taxonomy shared by the parser, the services and the HTTP layer.
///
/// `Validation`, `Schema` and `EmptyImport` are caller mistakes and carry text
/// meant for the user. `Storage` and `Upstream` carry backend detail that is
/// logged but never sent to the client.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("No valid budget data found in CSV")]
    EmptyImport,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Insight provider error: {0}")]
    Upstream(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True when the caller has to fix their input, false for server-side faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Schema { .. } | Error::EmptyImport
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Schema { .. } | Error::EmptyImport => {
                StatusCode::BAD_REQUEST
            }
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text safe to show to the user.
    pub fn public_message(&self) -> String {
        match self {
            Error::Storage(_) => STORAGE_FAILURE_MESSAGE.to_string(),
            Error::Upstream(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upstream(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_client_error() {
            tracing::warn!("Rejected request: {}", self);
        } else {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
