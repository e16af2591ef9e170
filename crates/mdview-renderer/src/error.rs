//! Error types for remote rendering.

/// Error from a call to a remote GitHub endpoint.
#[derive(Debug, thiserror::Error)]
pub enum MarkdownError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// Server returned a non-success status.
    #[error("Received {0} status from the GitHub API")]
    Status(u16),
}
