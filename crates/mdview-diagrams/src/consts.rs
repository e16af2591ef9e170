//! Constants for diagram rendering.

/// Fence info string that marks a diagram block.
pub(crate) const DIAGRAM_LANGUAGE: &str = "mermaid";

/// MIME type of every rendered diagram.
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// URL prefix under which rendered diagrams are served.
pub const DIAGRAM_ROUTE: &str = "/__diagram__/";

/// Mermaid bundle loaded into the headless browser.
pub const DEFAULT_MERMAID_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.min.js";

/// Background colour applied to rendered SVGs.
pub const DEFAULT_BACKGROUND_COLOR: &str = "white";
