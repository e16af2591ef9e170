//! Diagram cache keys.
//!
//! Keys double as the file name under [`DIAGRAM_ROUTE`](crate::DIAGRAM_ROUTE),
//! so both strategies produce `diagram-<N>.svg`.

use sha2::{Digest, Sha256};

/// How a diagram block is mapped to its cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    /// `N` is the block's zero-based index within the document.
    ///
    /// Two documents with a diagram at the same index share a key, so the
    /// lookup endpoint serves whichever was rendered last.
    #[default]
    Position,
    /// `N` is a truncated SHA-256 of the diagram source.
    ///
    /// Identical diagrams share one entry across documents, and reordering
    /// diagrams never invalidates the cache.
    Content,
}

/// Hex digits of the source hash kept in content keys (64 bits).
const CONTENT_HASH_LEN: usize = 16;

impl KeyStrategy {
    /// Parse a strategy name (`"position"` or `"content"`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "position" => Some(Self::Position),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    /// Strategy name as used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Content => "content",
        }
    }

    /// Compute the key for the block at `index` with the given `source`.
    #[must_use]
    pub fn key(self, index: usize, source: &str) -> String {
        match self {
            Self::Position => format!("diagram-{index}.svg"),
            Self::Content => format!("diagram-{}.svg", content_hash(source)),
        }
    }
}

fn content_hash(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(CONTENT_HASH_LEN);
    hash
}
