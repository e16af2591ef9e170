//! Serve command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mdview_config::{CliSettings, Config};
use mdview_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for serving Markdown.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Directory to serve, or a single Markdown file to render for every request.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file (default: auto-discover mdview.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Do not open the browser on startup.
    #[arg(long)]
    no_open: bool,

    /// Render Markdown locally instead of calling the GitHub API.
    #[arg(long)]
    offline: bool,

    /// Leave Mermaid blocks as code instead of rendering them.
    #[arg(long)]
    no_diagrams: bool,

    /// Enable verbose output (diagram and rendering logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, output: &Output) -> Result<(), CliError> {
        let (root, single_file) = resolve_target(&self.path)?;
        let cli_settings = self.cli_settings();

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        let host = config.server.host.clone();
        let open_browser = config.server.open_browser;
        let server_config = server_config_from_config(&config, root, single_file);

        run_server(server_config, |addr| {
            let url = format!("http://{host}:{}/", addr.port());
            output.info("");
            output.success_with("  view your markdown at ", &url);
            output.info("  press CTRL+C to quit");

            if open_browser && let Err(err) = webbrowser::open(&url) {
                tracing::debug!(error = %err, "Failed to open browser");
            }
        })
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }

    /// Build config overrides from flags.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            open_browser: self.no_open.then_some(false),
            offline: self.offline.then_some(true),
            diagrams_enabled: self.no_diagrams.then_some(false),
        }
    }
}

/// Split the PATH argument into the served root and an optional single file.
fn resolve_target(path: &Path) -> Result<(PathBuf, Option<PathBuf>), CliError> {
    if path.is_dir() {
        return Ok((path.to_path_buf(), None));
    }
    if path.is_file() {
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        return Ok((root, Some(path.to_path_buf())));
    }
    Err(CliError::PathNotFound(path.to_path_buf()))
}
