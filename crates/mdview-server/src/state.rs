//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use mdview_diagrams::{DiagramCache, DiagramProcessor};
use mdview_renderer::MarkdownRenderer;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical served root directory.
    pub(crate) root: PathBuf,
    /// File rendered for every request in single-file mode.
    pub(crate) single_file: Option<PathBuf>,
    /// Markdown to HTML renderer (blocking).
    pub(crate) markdown: Arc<MarkdownRenderer>,
    /// Diagram pipeline (`None` when diagrams are disabled).
    pub(crate) diagrams: Option<DiagramProcessor>,
    /// Rendered diagrams, read by the diagram endpoint.
    pub(crate) cache: Arc<DiagramCache>,
    /// Stylesheet URLs linked from every page.
    pub(crate) stylesheets: Vec<String>,
}
