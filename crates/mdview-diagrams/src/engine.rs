//! Rendering engine abstraction.
//!
//! The production engine is headless Chromium ([`ChromiumLauncher`](crate::ChromiumLauncher));
//! tests use a scripted engine.

use async_trait::async_trait;

use crate::error::EngineError;

/// A running engine that turns diagram source into SVG markup.
///
/// Implementations must accept concurrent `render` calls.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Render `source` to raw SVG markup.
    async fn render(&self, source: &str) -> Result<String, EngineError>;

    /// Stop the engine. Further renders may fail.
    async fn shutdown(&self) -> Result<(), EngineError>;
}

/// Starts a [`RenderEngine`]. Called at most once per successful launch.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    /// Launch the engine.
    async fn launch(&self) -> Result<Box<dyn RenderEngine>, EngineError>;
}
