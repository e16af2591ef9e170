//! Error types for diagram rendering.

/// Error from the rendering engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("failed to launch rendering engine: {0}")]
    Launch(String),

    /// Chrome DevTools Protocol error.
    #[error("{0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// The render script reported an error (e.g. invalid diagram syntax).
    #[error("{0}")]
    Render(String),

    /// The render script returned an unexpected value.
    #[error("unexpected render result: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error from looking up a rendered diagram by key.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// No successfully rendered diagram is stored under the key.
    #[error("diagram is not rendered: {0}")]
    NotRendered(String),
}

/// Error from processing a document.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// The shared rendering engine could not be started.
    #[error("diagram rendering engine unavailable")]
    EngineUnavailable(#[source] EngineError),
}
