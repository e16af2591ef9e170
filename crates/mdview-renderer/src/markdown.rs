//! Markdown to HTML conversion.

use std::time::Duration;

use pulldown_cmark::{Options, Parser, html};
use ureq::Agent;

use crate::error::MarkdownError;

/// GitHub endpoint that renders a raw Markdown body.
pub const DEFAULT_API_URL: &str = "https://api.github.com/markdown/raw";

/// Timeout for the remote rendering call. Kept short so a slow network falls
/// back to local rendering quickly.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// `User-Agent` sent to GitHub (required by its API).
pub const USER_AGENT: &str = "mdview";

/// Renders Markdown remotely with a local fallback.
///
/// `render` is blocking; call it from `spawn_blocking` in async code.
pub struct MarkdownRenderer {
    remote: Option<RemoteRenderer>,
}

struct RemoteRenderer {
    agent: Agent,
    api_url: String,
}

impl MarkdownRenderer {
    /// Renderer that tries `api_url` first, giving up after `timeout`.
    #[must_use]
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            remote: Some(RemoteRenderer {
                agent,
                api_url: api_url.into(),
            }),
        }
    }

    /// Renderer that only uses the local renderer.
    #[must_use]
    pub fn offline() -> Self {
        Self { remote: None }
    }

    /// Whether a remote API is configured.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.remote.is_none()
    }

    /// Render `text` to HTML.
    ///
    /// Never fails: remote errors are logged and the local renderer is used.
    #[must_use]
    pub fn render(&self, text: &str) -> String {
        if let Some(remote) = &self.remote {
            match remote.render(text) {
                Ok(html) => return html,
                Err(err) => {
                    tracing::warn!(url = %remote.api_url, error = %err, "Remote Markdown rendering failed, using local renderer");
                }
            }
        }
        render_local(text)
    }
}

impl RemoteRenderer {
    fn render(&self, text: &str) -> Result<String, MarkdownError> {
        let mut response = self
            .agent
            .post(&self.api_url)
            .header("Content-Type", "text/plain")
            .header("User-Agent", USER_AGENT)
            .send(text)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarkdownError::Status(status.as_u16()));
        }

        Ok(response.body_mut().read_to_string()?)
    }
}

/// Render `text` locally with GitHub-flavoured extensions.
#[must_use]
pub fn render_local(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_GFM;
    let parser = Parser::new_ext(text, options);

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}
