//! Configuration management for mdview.
//!
//! Parses `mdview.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `markdown.api_url`
//! - `markdown.stylesheet_source`
//! - `diagrams.mermaid_url`
//! - `diagrams.chrome_executable`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override opening the browser on startup.
    pub open_browser: Option<bool>,
    /// Override offline Markdown rendering.
    pub offline: Option<bool>,
    /// Override diagram rendering.
    pub diagrams_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdview.toml";

/// Application configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Markdown rendering configuration.
    pub markdown: MarkdownConfig,
    /// Diagram rendering configuration (paths are relative strings from TOML).
    diagrams: DiagramsConfigRaw,

    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Open the default browser once the server listens.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8124,
            open_browser: true,
        }
    }
}

/// Markdown rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// GitHub Markdown API endpoint.
    pub api_url: String,
    /// Timeout for the API call in milliseconds.
    pub timeout_ms: u64,
    /// Render locally without calling the API.
    pub offline: bool,
    /// Page scraped for GitHub stylesheet links.
    pub stylesheet_source: String,
    /// Timeout for stylesheet discovery in milliseconds.
    pub stylesheet_timeout_ms: u64,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com/markdown/raw".to_owned(),
            timeout_ms: 2000,
            offline: false,
            stylesheet_source: "https://github.com/aheckmann/greadme".to_owned(),
            stylesheet_timeout_ms: 4000,
        }
    }
}

/// Raw diagrams configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    enabled: Option<bool>,
    mermaid_url: Option<String>,
    chrome_executable: Option<String>,
    fetch_browser: Option<bool>,
    browser_dir: Option<String>,
    background_color: Option<String>,
    cache_keys: Option<String>,
}

/// Resolved diagram rendering configuration with absolute paths.
#[derive(Debug, PartialEq, Eq)]
pub struct DiagramsConfig {
    /// Whether Mermaid blocks are rendered.
    pub enabled: bool,
    /// URL of the Mermaid bundle loaded into the headless browser.
    pub mermaid_url: String,
    /// Chrome/Chromium executable (`None` auto-detects).
    pub chrome_executable: Option<PathBuf>,
    /// Download Chromium when no executable is configured.
    pub fetch_browser: bool,
    /// Directory for downloaded Chromium builds (`None` uses a temp directory).
    pub browser_dir: Option<PathBuf>,
    /// Background colour of rendered diagrams.
    pub background_color: String,
    /// Cache key strategy (`"position"` or `"content"`).
    pub cache_keys: String,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mermaid_url: "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.min.js".to_owned(),
            chrome_executable: None,
            fetch_browser: false,
            browser_dir: None,
            background_color: "white".to_owned(),
            cache_keys: "position".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`markdown.api_url`").
        field: String,
        /// Error message (e.g., "${`GITHUB_API`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use one of the given schemes.
fn require_scheme(url: &str, field: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if !schemes.iter().any(|scheme| url.starts_with(scheme)) {
        return Err(ConfigError::Validation(format!(
            "{field} must start with {}",
            schemes.join(" or ")
        )));
    }
    Ok(())
}

/// Require a timeout to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

/// Resolve an executable setting.
///
/// Bare command names (no path separator) are kept for a `PATH` lookup;
/// anything else is relative to the config directory.
fn resolve_executable(config_dir: &Path, value: &str) -> PathBuf {
    if value.contains(['/', std::path::MAIN_SEPARATOR]) {
        config_dir.join(value)
    } else {
        PathBuf::from(value)
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdview.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(open_browser) = settings.open_browser {
            self.server.open_browser = open_browser;
        }
        if let Some(offline) = settings.offline {
            self.markdown.offline = offline;
        }
        if let Some(enabled) = settings.diagrams_enabled {
            self.diagrams_resolved.enabled = enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_markdown()?;
        self.validate_diagrams()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate markdown configuration.
    fn validate_markdown(&self) -> Result<(), ConfigError> {
        const HTTP: &[&str] = &["http://", "https://"];

        require_scheme(&self.markdown.api_url, "markdown.api_url", HTTP)?;
        require_scheme(
            &self.markdown.stylesheet_source,
            "markdown.stylesheet_source",
            HTTP,
        )?;
        require_positive(self.markdown.timeout_ms, "markdown.timeout_ms")?;
        require_positive(
            self.markdown.stylesheet_timeout_ms,
            "markdown.stylesheet_timeout_ms",
        )?;
        Ok(())
    }

    /// Validate diagrams configuration.
    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        let diagrams = &self.diagrams_resolved;

        require_scheme(
            &diagrams.mermaid_url,
            "diagrams.mermaid_url",
            &["http://", "https://", "file://"],
        )?;
        require_non_empty(&diagrams.background_color, "diagrams.background_color")?;

        if !matches!(diagrams.cache_keys.as_str(), "position" | "content") {
            return Err(ConfigError::Validation(format!(
                "diagrams.cache_keys must be \"position\" or \"content\", got \"{}\"",
                diagrams.cache_keys
            )));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.markdown.api_url = expand::expand_env(&self.markdown.api_url, "markdown.api_url")?;
        self.markdown.stylesheet_source = expand::expand_env(
            &self.markdown.stylesheet_source,
            "markdown.stylesheet_source",
        )?;

        if let Some(ref url) = self.diagrams.mermaid_url {
            self.diagrams.mermaid_url = Some(expand::expand_env(url, "diagrams.mermaid_url")?);
        }
        if let Some(ref path) = self.diagrams.chrome_executable {
            self.diagrams.chrome_executable =
                Some(expand::expand_env(path, "diagrams.chrome_executable")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = DiagramsConfig::default();
        let raw = &self.diagrams;

        self.diagrams_resolved = DiagramsConfig {
            enabled: raw.enabled.unwrap_or(defaults.enabled),
            mermaid_url: raw.mermaid_url.clone().unwrap_or(defaults.mermaid_url),
            chrome_executable: raw
                .chrome_executable
                .as_deref()
                .map(|p| resolve_executable(config_dir, p)),
            fetch_browser: raw.fetch_browser.unwrap_or(defaults.fetch_browser),
            browser_dir: raw.browser_dir.as_deref().map(|p| config_dir.join(p)),
            background_color: raw
                .background_color
                .clone()
                .unwrap_or(defaults.background_color),
            cache_keys: raw.cache_keys.clone().unwrap_or(defaults.cache_keys),
        };
    }
}
