//! Headless Chromium rendering engine.
//!
//! Drives Chromium over the DevTools protocol with `chromiumoxide`. Each
//! render opens a fresh page that loads the Mermaid bundle, runs
//! `mermaid.render`, and returns the serialized SVG.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::CloseParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::page::Page;
use futures::StreamExt;
use mdview_renderer::escape_html;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::consts::{DEFAULT_BACKGROUND_COLOR, DEFAULT_MERMAID_URL};
use crate::engine::{EngineLauncher, RenderEngine};
use crate::error::EngineError;

/// Script run in the page for every diagram.
///
/// `__SOURCE__` and `__BACKGROUND__` are replaced with JSON string literals.
const RENDER_SCRIPT: &str = r"(async () => {
  const source = __SOURCE__;
  try {
    for (let i = 0; typeof window.mermaid === 'undefined'; i++) {
      if (i >= 200) throw new Error('Mermaid script failed to load');
      await new Promise((resolve) => setTimeout(resolve, 50));
    }
    const config = { startOnLoad: false };
    for (const kind of ['flowchart', 'sequence', 'gantt', 'class', 'state', 'er', 'journey', 'pie']) {
      config[kind] = { useMaxWidth: false };
    }
    window.mermaid.initialize(config);
    const { svg } = await window.mermaid.render('mdview-diagram', source);
    const container = document.createElement('div');
    container.innerHTML = svg;
    const element = container.querySelector('svg');
    element.style.backgroundColor = __BACKGROUND__;
    return { status: 'rendered', svg: new XMLSerializer().serializeToString(element) };
  } catch (err) {
    return { status: 'failed', message: String((err && err.message) || err || '') };
  }
})()";

/// Chromium engine configuration.
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    /// Chrome/Chromium executable (`None` auto-detects an installed browser).
    pub executable: Option<PathBuf>,
    /// Download a Chromium build when no executable is configured.
    pub fetch_browser: bool,
    /// Directory for downloaded browser builds.
    pub download_dir: PathBuf,
    /// URL of the Mermaid bundle loaded into each page.
    pub mermaid_url: String,
    /// CSS background colour of rendered diagrams.
    pub background_color: String,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            fetch_browser: false,
            download_dir: std::env::temp_dir().join("mdview-chromium"),
            mermaid_url: DEFAULT_MERMAID_URL.to_owned(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_owned(),
        }
    }
}

/// Launches headless Chromium.
pub struct ChromiumLauncher {
    config: ChromiumConfig,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }

    /// Executable to launch, downloading one if configured to.
    async fn executable(&self) -> Result<Option<PathBuf>, EngineError> {
        if let Some(path) = &self.config.executable {
            return Ok(Some(path.clone()));
        }
        if !self.config.fetch_browser {
            return Ok(None);
        }

        let download_dir = &self.config.download_dir;
        tokio::fs::create_dir_all(download_dir)
            .await
            .map_err(|e| EngineError::Launch(format!("{}: {e}", download_dir.display())))?;

        let options = BrowserFetcherOptions::builder()
            .with_path(download_dir)
            .build()
            .map_err(|e| EngineError::Launch(e.to_string()))?;
        tracing::info!(dir = %download_dir.display(), "Fetching Chromium");
        let info = BrowserFetcher::new(options)
            .fetch()
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        Ok(Some(info.executable_path))
    }
}

#[async_trait]
impl EngineLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderEngine>, EngineError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox");
        if let Some(path) = self.executable().await? {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(EngineError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::info!("Headless Chromium started");
        Ok(Box::new(ChromiumEngine {
            browser,
            handler,
            host_page: host_page(&self.config.mermaid_url),
            background_color: self.config.background_color.clone(),
        }))
    }
}

/// Result object returned by [`RENDER_SCRIPT`].
#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum ScriptOutcome {
    Rendered { svg: String },
    Failed { message: String },
}

struct ChromiumEngine {
    browser: Browser,
    handler: JoinHandle<()>,
    host_page: String,
    background_color: String,
}

impl ChromiumEngine {
    async fn render_on(&self, page: &Page, source: &str) -> Result<String, EngineError> {
        page.set_content(&self.host_page).await?;

        let script = RENDER_SCRIPT
            .replace("__SOURCE__", &serde_json::to_string(source)?)
            .replace("__BACKGROUND__", &serde_json::to_string(&self.background_color)?);
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(EngineError::Render)?;

        match page.evaluate_expression(params).await?.into_value()? {
            ScriptOutcome::Rendered { svg } => Ok(svg),
            ScriptOutcome::Failed { message } => Err(EngineError::Render(message)),
        }
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    async fn render(&self, source: &str) -> Result<String, EngineError> {
        let page = self.browser.new_page("about:blank").await?;
        let result = self.render_on(&page, source).await;
        if let Err(err) = page.close().await {
            tracing::debug!(error = %err, "Failed to close diagram page");
        }
        result
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.browser.execute(CloseParams::default()).await?;
        self.handler.abort();
        Ok(())
    }
}

/// HTML page that loads the Mermaid bundle.
fn host_page(mermaid_url: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<script src=\"{}\"></script>\n</head>\n<body></body>\n</html>\n",
        escape_html(mermaid_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_page_loads_mermaid() {
        let page = host_page(DEFAULT_MERMAID_URL);

        assert!(page.contains(&format!("<script src=\"{DEFAULT_MERMAID_URL}\"></script>")));
    }

    #[test]
    fn test_host_page_escapes_url() {
        let page = host_page("https://example.com/m.js?a=1&b=\"2\"");

        assert!(page.contains("a=1&amp;b=&quot;2&quot;"));
    }

    #[test]
    fn test_script_outcome_rendered() {
        let outcome: ScriptOutcome =
            serde_json::from_str(r#"{"status":"rendered","svg":"<svg/>"}"#).unwrap();

        assert!(matches!(outcome, ScriptOutcome::Rendered { ref svg } if svg == "<svg/>"));
    }

    #[test]
    fn test_script_outcome_failed() {
        let outcome: ScriptOutcome =
            serde_json::from_str(r#"{"status":"failed","message":"Parse error"}"#).unwrap();

        assert!(matches!(outcome, ScriptOutcome::Failed { ref message } if message == "Parse error"));
    }

    #[test]
    fn test_script_placeholders() {
        assert!(RENDER_SCRIPT.contains("__SOURCE__"));
        assert!(RENDER_SCRIPT.contains("__BACKGROUND__"));
    }

    #[test]
    fn test_default_config() {
        let config = ChromiumConfig::default();

        assert!(config.executable.is_none());
        assert!(!config.fetch_browser);
        assert_eq!(config.mermaid_url, DEFAULT_MERMAID_URL);
        assert_eq!(config.background_color, "white");
    }
}
