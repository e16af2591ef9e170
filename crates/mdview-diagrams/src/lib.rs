//! Mermaid diagram rendering for mdview.
//!
//! This crate turns fenced `mermaid` blocks in a Markdown document into image
//! references served by the preview server:
//! - [`extract`] finds diagram blocks and their byte spans
//! - [`DiagramRenderer`] renders diagram source to SVG through a lazily
//!   launched, shared [`RenderEngine`] (headless Chromium in production)
//! - [`DiagramCache`] remembers the last outcome per [`KeyStrategy`] key
//! - [`DiagramProcessor`] ties them together: concurrent renders, ordered
//!   reassembly
//!
//! # Architecture
//!
//! ```text
//! document ──► extract ──► [block 0, block 1, ...]
//!                               │
//!                               ├─► cache hit (same source) ──► cached outcome
//!                               └─► cache miss ──► DiagramRenderer ──► RenderEngine
//!                                                        │
//!                               join_all (input order) ◄─┘
//!                               │
//! document' ◄── splice fragments into block spans
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mdview_diagrams::{ChromiumConfig, ChromiumLauncher, DiagramCache, DiagramProcessor, DiagramRenderer};
//!
//! let renderer = Arc::new(DiagramRenderer::new(ChromiumLauncher::new(ChromiumConfig::default())));
//! let processor = DiagramProcessor::new(renderer, Arc::new(DiagramCache::new()));
//!
//! let html_ready = processor.process("```mermaid\ngraph TD\n  A --> B\n```\n").await?;
//! ```

mod cache;
mod chromium;
mod consts;
mod engine;
mod error;
mod extract;
mod failure;
mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod processor;
mod renderer;
mod svg;

pub use cache::{CacheEntry, CachedOutcome, DiagramCache, RenderedDiagram};
pub use chromium::{ChromiumConfig, ChromiumLauncher};
pub use consts::{DEFAULT_BACKGROUND_COLOR, DEFAULT_MERMAID_URL, DIAGRAM_ROUTE, SVG_CONTENT_TYPE};
pub use engine::{EngineLauncher, RenderEngine};
pub use error::{DiagramError, EngineError, LookupError};
pub use extract::{DiagramBlock, extract};
pub use key::KeyStrategy;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockLauncher, MockStats};
pub use processor::DiagramProcessor;
pub use renderer::{DiagramRenderer, RenderFailure, RenderOutcome};
