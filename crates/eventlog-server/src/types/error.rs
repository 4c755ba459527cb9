//! Error types and HTTP status mapping for the event log server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use eventlog::EventLogError;

/// All errors that can occur in the event log server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidParams(String),

    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid date for {param}: {value}")]
    InvalidDate { param: &'static str, value: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidParams(_)
            | ServerError::MissingParam(_)
            | ServerError::InvalidDate { .. }
            | ServerError::Json(_)
            | ServerError::Storage(_) => StatusCode::BAD_REQUEST,
            ServerError::Transport(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EventLogError> for ServerError {
    fn from(e: EventLogError) -> Self {
        match e {
            EventLogError::InvalidInput(msg) => ServerError::InvalidParams(msg),
            EventLogError::InvalidPeriod { .. } => ServerError::InvalidParams(e.to_string()),
            EventLogError::Io(io) => ServerError::Io(io),
            EventLogError::Json(json) => ServerError::Json(json),
            EventLogError::Storage(msg) => ServerError::Storage(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::warn!("Request rejected: {self}");
        }
        (status, self.to_string()).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
