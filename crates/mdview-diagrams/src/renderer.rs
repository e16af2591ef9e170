//! Diagram renderer with a lazily launched shared engine.

use tokio::sync::OnceCell;

use crate::cache::{CachedOutcome, RenderedDiagram};
use crate::consts::SVG_CONTENT_TYPE;
use crate::engine::{EngineLauncher, RenderEngine};
use crate::error::EngineError;
use crate::failure::error_text;
use crate::svg::{extract_title, fix_height};

/// A diagram that failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    /// Cache key of the diagram.
    pub key: String,
    /// Message shown in place of the diagram.
    pub error_text: String,
}

/// Outcome of rendering a single diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(RenderedDiagram),
    Failed(RenderFailure),
}

impl From<RenderOutcome> for CachedOutcome {
    fn from(outcome: RenderOutcome) -> Self {
        match outcome {
            RenderOutcome::Rendered(diagram) => Self::Rendered(diagram),
            RenderOutcome::Failed(failure) => Self::Failed(failure.error_text),
        }
    }
}

/// Renders diagram source through a single shared [`RenderEngine`].
///
/// The engine is launched on the first render and reused afterwards.
/// Concurrent first renders wait for one launch. A failed launch leaves the
/// renderer unstarted, so the next render tries again; an engine that breaks
/// after launching is never replaced.
pub struct DiagramRenderer {
    launcher: Box<dyn EngineLauncher>,
    engine: OnceCell<Box<dyn RenderEngine>>,
}

impl DiagramRenderer {
    /// Create a renderer that launches its engine with `launcher` on first use.
    #[must_use]
    pub fn new(launcher: impl EngineLauncher + 'static) -> Self {
        Self {
            launcher: Box::new(launcher),
            engine: OnceCell::new(),
        }
    }

    /// Whether the engine has been launched.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<&dyn RenderEngine, EngineError> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                tracing::info!("Launching diagram rendering engine");
                self.launcher.launch().await
            })
            .await?;
        Ok(&**engine)
    }

    /// Render one diagram.
    ///
    /// Per-diagram errors are returned as [`RenderOutcome::Failed`]; only an
    /// engine that cannot be launched yields `Err`.
    pub async fn render(
        &self,
        index: usize,
        key: &str,
        source: &str,
    ) -> Result<RenderOutcome, EngineError> {
        let engine = self.engine().await?;

        match engine.render(source).await {
            Ok(svg) => {
                let payload = fix_height(&svg);
                let title = extract_title(&payload).unwrap_or_else(|| format!("diagram_{index}"));
                tracing::debug!(key, "Rendered diagram");
                Ok(RenderOutcome::Rendered(RenderedDiagram {
                    title,
                    payload,
                    content_type: SVG_CONTENT_TYPE,
                }))
            }
            Err(err) => {
                tracing::warn!(key, error = %err, "Diagram rendering failed");
                let message = err.to_string();
                Ok(RenderOutcome::Failed(RenderFailure {
                    key: key.to_owned(),
                    error_text: error_text(Some(&message), source),
                }))
            }
        }
    }

    /// Stop the engine if it was launched.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        if let Some(engine) = self.engine.get() {
            tracing::info!("Stopping diagram rendering engine");
            engine.shutdown().await?;
        }
        Ok(())
    }
}
