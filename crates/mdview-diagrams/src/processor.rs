//! Document-level diagram processing.
//!
//! This module provides [`DiagramProcessor`], which replaces every diagram
//! block in a Markdown document with an image reference or an error block
//! before the document is handed to the Markdown renderer.

use std::sync::Arc;

use futures::future::join_all;
use mdview_renderer::escape_html;

use crate::cache::{CacheEntry, CachedOutcome, DiagramCache};
use crate::consts::DIAGRAM_ROUTE;
use crate::error::{DiagramError, EngineError};
use crate::extract::{DiagramBlock, extract};
use crate::key::KeyStrategy;
use crate::renderer::DiagramRenderer;

/// Replaces diagram blocks in documents using a shared renderer and cache.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use mdview_diagrams::{DiagramCache, DiagramProcessor, DiagramRenderer, KeyStrategy};
///
/// let processor = DiagramProcessor::new(renderer, Arc::new(DiagramCache::new()))
///     .key_strategy(KeyStrategy::Content);
///
/// let document = processor.process(&markdown).await?;
/// ```
pub struct DiagramProcessor {
    renderer: Arc<DiagramRenderer>,
    cache: Arc<DiagramCache>,
    keys: KeyStrategy,
}

impl DiagramProcessor {
    /// Create a processor with positional cache keys.
    #[must_use]
    pub fn new(renderer: Arc<DiagramRenderer>, cache: Arc<DiagramCache>) -> Self {
        Self {
            renderer,
            cache,
            keys: KeyStrategy::default(),
        }
    }

    /// Set how diagram blocks map to cache keys.
    #[must_use]
    pub fn key_strategy(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    /// Cache holding rendered diagrams.
    #[must_use]
    pub fn cache(&self) -> &Arc<DiagramCache> {
        &self.cache
    }

    /// Renderer used for cache misses.
    #[must_use]
    pub fn renderer(&self) -> &Arc<DiagramRenderer> {
        &self.renderer
    }

    /// Replace all diagram blocks in `document`.
    ///
    /// Cache misses are rendered concurrently; replacements are spliced in
    /// block order regardless of which render finishes first. A diagram that
    /// fails to render becomes a `<pre>` error block without affecting its
    /// siblings.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::EngineUnavailable`] if the rendering engine
    /// cannot be launched.
    pub async fn process(&self, document: &str) -> Result<String, DiagramError> {
        let blocks = extract(document);
        if blocks.is_empty() {
            return Ok(document.to_owned());
        }

        let fragments = join_all(
            blocks
                .iter()
                .enumerate()
                .map(|(index, block)| self.resolve(index, block)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(DiagramError::EngineUnavailable)?;

        Ok(splice(document, &blocks, &fragments))
    }

    /// Produce the HTML fragment for one block, rendering on a cache miss.
    async fn resolve(&self, index: usize, block: &DiagramBlock) -> Result<String, EngineError> {
        let key = self.keys.key(index, &block.source);

        if let Some(outcome) = self.cache.get_fresh(&key, &block.source) {
            tracing::debug!(key = %key, "Diagram cache hit");
            return Ok(fragment(&key, &outcome));
        }

        let outcome: CachedOutcome = self
            .renderer
            .render(index, &key, &block.source)
            .await?
            .into();
        let html = fragment(&key, &outcome);
        self.cache.put(
            key,
            CacheEntry {
                source: block.source.clone(),
                outcome,
            },
        );
        Ok(html)
    }
}

/// HTML that replaces a diagram block.
fn fragment(key: &str, outcome: &CachedOutcome) -> String {
    match outcome {
        CachedOutcome::Rendered(diagram) => format!(
            r#"<div align="center"><img src="{DIAGRAM_ROUTE}{key}" alt="{}"></div>"#,
            escape_html(&diagram.title)
        ),
        CachedOutcome::Failed(error_text) => format!("<pre>{}</pre>", escape_html(error_text)),
    }
}

/// Replace each block span with the fragment at the same position.
fn splice(document: &str, blocks: &[DiagramBlock], fragments: &[String]) -> String {
    let mut result = String::with_capacity(document.len());
    let mut last = 0;
    for (block, fragment) in blocks.iter().zip(fragments) {
        result.push_str(&document[last..block.start]);
        result.push_str(fragment);
        last = block.end;
    }
    result.push_str(&document[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLauncher, MockStats};
    use pretty_assertions::assert_eq;

    fn processor(launcher: MockLauncher) -> (DiagramProcessor, Arc<MockStats>) {
        let stats = launcher.stats();
        let renderer = Arc::new(DiagramRenderer::new(launcher));
        (
            DiagramProcessor::new(renderer, Arc::new(DiagramCache::new())),
            stats,
        )
    }

    fn img(key: &str, title: &str) -> String {
        format!(r#"<div align="center"><img src="/__diagram__/{key}" alt="{title}"></div>"#)
    }

    #[tokio::test]
    async fn test_document_without_diagrams_is_unchanged() {
        let (processor, stats) = processor(MockLauncher::new());
        let doc = "# Title\n\n```rust\nfn main() {}\n```\n";

        assert_eq!(processor.process(doc).await.unwrap(), doc);
        assert_eq!(stats.launches(), 0);
        assert!(!processor.renderer().is_started());
    }

    #[tokio::test]
    async fn test_replaces_block_with_image_reference() {
        let (processor, _) = processor(MockLauncher::new());
        let doc = "Intro\n\n```mermaid\ngraph TD\n  A --> B\n```\n\nOutro\n";

        let result = processor.process(doc).await.unwrap();

        assert_eq!(
            result,
            format!("Intro\n\n{}\n\nOutro\n", img("diagram-0.svg", "diagram_0"))
        );
        let cached = processor.cache().lookup("diagram-0.svg").unwrap();
        assert!(cached.payload.contains(r#"height="100""#));
    }

    #[tokio::test]
    async fn test_second_pass_is_served_from_cache() {
        let (processor, stats) = processor(MockLauncher::new());
        let doc = "```mermaid\ngraph TD\n```\n\n```mermaid\ngraph LR\n```\n";

        let first = processor.process(doc).await.unwrap();
        assert_eq!(stats.renders(), 2);

        let second = processor.process(doc).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(stats.renders(), 2);
    }

    #[tokio::test]
    async fn test_changed_source_is_rerendered() {
        let (processor, stats) = processor(MockLauncher::new());

        processor
            .process("```mermaid\ngraph TD\n```\n")
            .await
            .unwrap();
        let before = processor.cache().lookup("diagram-0.svg").unwrap();

        processor
            .process("```mermaid\ngraph TD\n  A --> B\n```\n")
            .await
            .unwrap();
        let after = processor.cache().get("diagram-0.svg").unwrap();

        assert_eq!(stats.renders(), 2);
        assert_eq!(after.source, "graph TD\n  A --> B\n");
        assert_ne!(
            processor.cache().lookup("diagram-0.svg").unwrap().payload,
            before.payload
        );
    }

    #[tokio::test]
    async fn test_order_preserved_when_renders_complete_in_reverse() {
        let (processor, stats) = processor(MockLauncher::new());
        let doc = "A\n```mermaid\ngraph TD\naccTitle: first\n%% delay 300\n```\nB\n```mermaid\ngraph TD\naccTitle: second\n%% delay 150\n```\nC\n```mermaid\ngraph TD\naccTitle: third\n%% delay 0\n```\nD\n";

        let started = std::time::Instant::now();
        let result = processor.process(doc).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(stats.completions(), vec!["third", "second", "first"]);
        assert_eq!(
            result,
            format!(
                "A\n{}\nB\n{}\nC\n{}\nD\n",
                img("diagram-0.svg", "first"),
                img("diagram-1.svg", "second"),
                img("diagram-2.svg", "third"),
            )
        );
        // Concurrent renders finish with the slowest one, not the sum of delays
        assert!(elapsed < std::time::Duration::from_millis(450), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_title_escaped_once_in_fragment() {
        let (processor, _) = processor(MockLauncher::new());

        let result = processor
            .process("```mermaid\ngraph TD\naccTitle: Orders & Payments\n```\n")
            .await
            .unwrap();

        assert_eq!(result, format!("{}\n", img("diagram-0.svg", "Orders &amp; Payments")));
        let cached = processor.cache().lookup("diagram-0.svg").unwrap();
        assert_eq!(cached.title, "Orders & Payments");
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let (processor, _) = processor(MockLauncher::new());
        let doc = "```mermaid\ngraph TD\n```\n```mermaid\ninvalid syntax\n```\n```mermaid\ngraph LR\n```\n";

        let result = processor.process(doc).await.unwrap();

        assert_eq!(result.matches("<pre>").count(), 1);
        assert_eq!(result.matches("<img ").count(), 2);
        assert_eq!(
            result,
            format!(
                "{}\n<pre>Parse error on line 1:\ninvalid syntax\n^</pre>\n{}\n",
                img("diagram-0.svg", "diagram_0"),
                img("diagram-2.svg", "diagram_2"),
            )
        );
    }

    #[tokio::test]
    async fn test_one_failure_among_three_valid() {
        let (processor, stats) = processor(MockLauncher::new());
        let doc = "```mermaid\ngraph TD\n```\n```mermaid\ngraph LR\n```\n```mermaid\ninvalid syntax\n```\n```mermaid\ngraph BT\n```\n";

        let result = processor.process(doc).await.unwrap();

        assert_eq!(stats.renders(), 4);
        assert_eq!(result.matches("<pre>").count(), 1);
        assert_eq!(result.matches("<img ").count(), 3);
        assert_eq!(
            result,
            format!(
                "{}\n{}\n<pre>Parse error on line 1:\ninvalid syntax\n^</pre>\n{}\n",
                img("diagram-0.svg", "diagram_0"),
                img("diagram-1.svg", "diagram_1"),
                img("diagram-3.svg", "diagram_3"),
            )
        );
    }

    #[tokio::test]
    async fn test_failure_is_cached_until_source_changes() {
        let (processor, stats) = processor(MockLauncher::new());
        let doc = "```mermaid\ninvalid\n```\n";

        let first = processor.process(doc).await.unwrap();
        let second = processor.process(doc).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(stats.renders(), 1);
        assert!(processor.cache().lookup("diagram-0.svg").is_err());
    }

    #[tokio::test]
    async fn test_empty_diagram_renders_error_block() {
        let (processor, _) = processor(MockLauncher::new());

        let result = processor.process("```mermaid\n```\n").await.unwrap();

        assert_eq!(result, "<pre>No diagram type detected</pre>\n");
    }

    #[tokio::test]
    async fn test_error_text_is_escaped() {
        let (processor, _) = processor(MockLauncher::new());

        let result = processor
            .process("```mermaid\ninvalid A --> <B>\n```\n")
            .await
            .unwrap();

        assert!(result.contains("invalid A --&gt; &lt;B&gt;"));
    }

    #[tokio::test]
    async fn test_engine_unavailable_propagates() {
        let (processor, _) = processor(MockLauncher::failing());

        let result = processor.process("```mermaid\ngraph TD\n```\n").await;

        assert!(matches!(result, Err(DiagramError::EngineUnavailable(_))));
        assert!(processor.cache().is_empty());
    }

    #[tokio::test]
    async fn test_content_keys() {
        let (processor, stats) = processor(MockLauncher::new());
        let processor = processor.key_strategy(KeyStrategy::Content);
        let key = KeyStrategy::Content.key(0, "graph TD\n");

        let first = processor
            .process("```mermaid\ngraph TD\n```\n")
            .await
            .unwrap();
        // Same diagram moved behind another one keeps its key and cache entry
        let second = processor
            .process("```mermaid\ngraph LR\n```\n```mermaid\ngraph TD\n```\n")
            .await
            .unwrap();

        assert!(first.contains(&format!("/__diagram__/{key}")));
        assert!(second.ends_with(&format!("{}\n", img(&key, "diagram_0"))));
        assert_eq!(stats.renders(), 2);
    }

    #[test]
    fn test_splice_keeps_surrounding_text() {
        let doc = "aa[X]bb[Y]cc";
        let blocks = vec![
            DiagramBlock {
                source: String::new(),
                start: 2,
                end: 5,
            },
            DiagramBlock {
                source: String::new(),
                start: 7,
                end: 10,
            },
        ];

        let result = splice(doc, &blocks, &["1".to_owned(), "2".to_owned()]);

        assert_eq!(result, "aa1bb2cc");
    }
}
