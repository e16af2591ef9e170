//! Markdown rendering for mdview.
//!
//! Documents are rendered by the GitHub Markdown API so previews match the
//! hosted rendering. When the API is unreachable, slow, or disabled, a local
//! `pulldown-cmark` renderer with GitHub-flavoured extensions takes over.
//!
//! # Example
//!
//! ```
//! use mdview_renderer::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::offline();
//! let html = renderer.render("# Hello\n\n**Bold** text");
//! assert!(html.contains("<strong>Bold</strong>"));
//! ```

mod error;
mod html;
mod markdown;
mod style;

pub use error::MarkdownError;
pub use html::escape_html;
pub use markdown::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT, MarkdownRenderer, USER_AGENT, render_local,
};
pub use style::{
    DEFAULT_STYLESHEET_SOURCE, DEFAULT_STYLESHEET_TIMEOUT, FALLBACK_STYLESHEET,
    discover_stylesheets, stylesheet_hrefs,
};
