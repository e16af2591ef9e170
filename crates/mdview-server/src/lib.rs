//! HTTP preview server for mdview.
//!
//! This crate serves a directory (or a single file) of Markdown over HTTP:
//! - Markdown files rendered through the GitHub API (local fallback), with
//!   Mermaid blocks replaced by rendered diagram images
//! - Directory pages with README discovery and a listing
//! - Rendered diagrams under `/__diagram__/{key}`
//! - The bundled stylesheet under `/css/`
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use mdview_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         root: PathBuf::from("."),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config, |addr| println!("listening on {addr}")).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (mdview-server)
//!                        │
//!                        ├─► /__diagram__/{key} ──► DiagramCache
//!                        ├─► /css/{*path} ──► mdview-assets
//!                        └─► page handler
//!                                │
//!                                ├─► DiagramProcessor ──► headless Chromium
//!                                └─► MarkdownRenderer (spawn_blocking) ──► GitHub API
//! ```

mod app;
mod error;
mod handlers;
mod listing;
mod middleware;
mod state;
mod static_files;
mod template;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mdview_diagrams::{
    ChromiumConfig, ChromiumLauncher, DiagramCache, DiagramProcessor, DiagramRenderer,
    KeyStrategy,
};
use mdview_renderer::{
    DEFAULT_API_URL, DEFAULT_STYLESHEET_SOURCE, DEFAULT_STYLESHEET_TIMEOUT, DEFAULT_TIMEOUT,
    FALLBACK_STYLESHEET, MarkdownRenderer,
};
use state::AppState;

pub use error::ServerError;

/// Diagram rendering settings.
#[derive(Clone, Debug, Default)]
pub struct DiagramSettings {
    /// Headless Chromium configuration.
    pub chromium: ChromiumConfig,
    /// Cache key strategy.
    pub keys: KeyStrategy,
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Served root directory.
    pub root: PathBuf,
    /// Render this file for every request instead of browsing `root`.
    pub single_file: Option<PathBuf>,
    /// GitHub Markdown API endpoint (`None` renders locally only).
    pub api_url: Option<String>,
    /// Timeout for the Markdown API call.
    pub api_timeout: Duration,
    /// Page scraped for stylesheet links (`None` uses the bundled CSS).
    pub stylesheet_source: Option<String>,
    /// Timeout for stylesheet discovery.
    pub stylesheet_timeout: Duration,
    /// Diagram rendering (`None` leaves Mermaid blocks untouched).
    pub diagrams: Option<DiagramSettings>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8124,
            root: PathBuf::from("."),
            single_file: None,
            api_url: Some(DEFAULT_API_URL.to_owned()),
            api_timeout: DEFAULT_TIMEOUT,
            stylesheet_source: Some(DEFAULT_STYLESHEET_SOURCE.to_owned()),
            stylesheet_timeout: DEFAULT_STYLESHEET_TIMEOUT,
            diagrams: Some(DiagramSettings::default()),
        }
    }
}

/// Run the server until Ctrl-C.
///
/// `on_listen` is called with the bound address once the socket accepts
/// connections. The diagram engine, if it was started, is stopped after the
/// server shuts down.
///
/// # Errors
///
/// Returns an error if the root cannot be resolved or the socket cannot be
/// bound.
pub async fn run_server(
    config: ServerConfig,
    on_listen: impl FnOnce(SocketAddr),
) -> std::io::Result<()> {
    let root = config.root.canonicalize()?;
    let single_file = config
        .single_file
        .as_deref()
        .map(std::path::Path::canonicalize)
        .transpose()?;

    let stylesheets = match config.stylesheet_source.clone() {
        Some(source) => {
            let timeout = config.stylesheet_timeout;
            tokio::task::spawn_blocking(move || {
                mdview_renderer::discover_stylesheets(&source, timeout)
            })
            .await
            .map_err(std::io::Error::other)?
        }
        None => vec![FALLBACK_STYLESHEET.to_owned()],
    };

    let markdown = match &config.api_url {
        Some(url) => MarkdownRenderer::new(url.clone(), config.api_timeout),
        None => MarkdownRenderer::offline(),
    };

    let cache = Arc::new(DiagramCache::new());
    let diagrams = config.diagrams.map(|settings| {
        let renderer = Arc::new(DiagramRenderer::new(ChromiumLauncher::new(
            settings.chromium,
        )));
        DiagramProcessor::new(renderer, Arc::clone(&cache)).key_strategy(settings.keys)
    });
    let renderer = diagrams.as_ref().map(|p| Arc::clone(p.renderer()));

    let state = Arc::new(AppState {
        root,
        single_file,
        markdown: Arc::new(markdown),
        diagrams,
        cache,
        stylesheets,
    });

    let app = app::create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Starting server");
    on_listen(addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(renderer) = renderer
        && let Err(err) = renderer.shutdown().await
    {
        tracing::warn!(error = %err, "Failed to stop diagram rendering engine");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from mdview config.
///
/// # Arguments
///
/// * `config` - mdview configuration
/// * `root` - Served root directory
/// * `single_file` - File to render for every request
#[must_use]
pub fn server_config_from_config(
    config: &mdview_config::Config,
    root: PathBuf,
    single_file: Option<PathBuf>,
) -> ServerConfig {
    let markdown = &config.markdown;
    let diagrams = &config.diagrams_resolved;

    let (api_url, stylesheet_source) = if markdown.offline {
        (None, None)
    } else {
        (
            Some(markdown.api_url.clone()),
            Some(markdown.stylesheet_source.clone()),
        )
    };

    let diagram_settings = diagrams.enabled.then(|| {
        let defaults = ChromiumConfig::default();
        DiagramSettings {
            chromium: ChromiumConfig {
                executable: diagrams.chrome_executable.clone(),
                fetch_browser: diagrams.fetch_browser,
                download_dir: diagrams
                    .browser_dir
                    .clone()
                    .unwrap_or(defaults.download_dir),
                mermaid_url: diagrams.mermaid_url.clone(),
                background_color: diagrams.background_color.clone(),
            },
            keys: KeyStrategy::parse(&diagrams.cache_keys).unwrap_or_default(),
        }
    });

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root,
        single_file,
        api_url,
        api_timeout: Duration::from_millis(markdown.timeout_ms),
        stylesheet_source,
        stylesheet_timeout: Duration::from_millis(markdown.stylesheet_timeout_ms),
        diagrams: diagram_settings,
    }
}
