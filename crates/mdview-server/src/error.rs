//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdview_diagrams::{DiagramError, LookupError};
use serde_json::json;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Nothing to serve at the requested path.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Diagram lookup miss.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Diagram pipeline failure (engine could not be started).
    #[error("{0}")]
    Diagram(#[from] DiagramError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task panicked or was cancelled.
    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound(path) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Not found", "path": path}),
            ),
            Self::Lookup(LookupError::NotRendered(key)) => (
                StatusCode::NOT_FOUND,
                json!({"error": "diagram is not rendered", "key": key}),
            ),
            Self::Diagram(_) | Self::Io(_) | Self::Task(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.to_string()}),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
