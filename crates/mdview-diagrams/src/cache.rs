//! In-memory diagram cache.
//!
//! Holds the last render outcome per key together with the source it was
//! rendered from. Entries live for the lifetime of the cache and are replaced
//! whole when the same key is rendered again.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::LookupError;

/// A successfully rendered diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// Display label used as the image `alt` text.
    pub title: String,
    /// Image payload (SVG markup).
    pub payload: String,
    /// MIME type of the payload.
    pub content_type: &'static str,
}

/// Result of the last render attempt for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedOutcome {
    /// Rendered image.
    Rendered(RenderedDiagram),
    /// Formatted error text.
    Failed(String),
}

/// Cache entry: an outcome and the diagram source it was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Diagram source text.
    pub source: String,
    /// Render outcome for `source`.
    pub outcome: CachedOutcome,
}

/// Process-scoped map from diagram key to [`CacheEntry`].
///
/// Never evicts. Shared between the document pipeline (which fills it) and
/// the diagram endpoint (which reads it).
#[derive(Debug, Default)]
pub struct DiagramCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl DiagramCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Outcome stored under `key` if it was rendered from exactly `source`.
    #[must_use]
    pub fn get_fresh(&self, key: &str, source: &str) -> Option<CachedOutcome> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|entry| entry.source == source)
            .map(|entry| entry.outcome.clone())
    }

    /// Store `entry` under `key`, replacing any previous entry.
    pub fn put(&self, key: String, entry: CacheEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Rendered diagram stored under `key`.
    ///
    /// Returns [`LookupError::NotRendered`] when the key is unknown or its last
    /// render failed.
    pub fn lookup(&self, key: &str) -> Result<RenderedDiagram, LookupError> {
        match self.get(key) {
            Some(CacheEntry {
                outcome: CachedOutcome::Rendered(diagram),
                ..
            }) => Ok(diagram),
            _ => Err(LookupError::NotRendered(key.to_owned())),
        }
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
