//! GitHub stylesheet discovery.
//!
//! GitHub's CSS bundles change names with every deploy, so the current ones are
//! scraped from any GitHub page at startup. The embedded stylesheet is used
//! when that fails.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use ureq::Agent;

use crate::error::MarkdownError;
use crate::markdown::USER_AGENT;

/// Page whose `<link>` tags are scraped for stylesheets.
pub const DEFAULT_STYLESHEET_SOURCE: &str = "https://github.com/aheckmann/greadme";

/// Timeout for fetching the stylesheet source page.
pub const DEFAULT_STYLESHEET_TIMEOUT: Duration = Duration::from_millis(4000);

/// Embedded stylesheet served by mdview itself.
pub const FALLBACK_STYLESHEET: &str = "/css/style.css";

static CSS_HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["']([^"']+\.css)"#).expect("invalid stylesheet regex"));

/// Stylesheet URLs referenced by `html`, in document order.
#[must_use]
pub fn stylesheet_hrefs(html: &str) -> Vec<String> {
    CSS_HREF_PATTERN
        .captures_iter(html)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Fetch `source_url` and return the stylesheets it links to.
///
/// Blocking. Falls back to [`FALLBACK_STYLESHEET`] on any error or when the
/// page links no stylesheets.
#[must_use]
pub fn discover_stylesheets(source_url: &str, timeout: Duration) -> Vec<String> {
    match fetch_page(source_url, timeout) {
        Ok(body) => {
            let hrefs = stylesheet_hrefs(&body);
            if hrefs.is_empty() {
                tracing::warn!(url = source_url, "No stylesheets found, using bundled CSS");
                vec![FALLBACK_STYLESHEET.to_owned()]
            } else {
                tracing::info!(url = source_url, count = hrefs.len(), "Discovered GitHub stylesheets");
                hrefs
            }
        }
        Err(err) => {
            tracing::warn!(url = source_url, error = %err, "Could not retrieve latest GitHub CSS, using bundled CSS");
            vec![FALLBACK_STYLESHEET.to_owned()]
        }
    }
}

fn fetch_page(url: &str, timeout: Duration) -> Result<String, MarkdownError> {
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into();

    let mut response = agent.get(url).header("User-Agent", USER_AGENT).call()?;
    let status = response.status();
    if !status.is_success() {
        return Err(MarkdownError::Status(status.as_u16()));
    }
    Ok(response.body_mut().read_to_string()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stylesheet_hrefs() {
        let html = r#"
            <link crossorigin="anonymous" media="all" rel="stylesheet" href="https://github.githubassets.com/assets/light-0eace2597ca3.css" />
            <link rel='stylesheet' href='https://github.githubassets.com/assets/github-6e8f5c2a1b.css'>
            <link rel="icon" href="https://github.githubassets.com/favicons/favicon.svg">
        "#;

        assert_eq!(
            stylesheet_hrefs(html),
            vec![
                "https://github.githubassets.com/assets/light-0eace2597ca3.css",
                "https://github.githubassets.com/assets/github-6e8f5c2a1b.css",
            ]
        );
    }

    #[test]
    fn test_stylesheet_hrefs_none() {
        assert!(stylesheet_hrefs("<html><head></head></html>").is_empty());
    }

    #[test]
    fn test_discover_falls_back_on_error() {
        let sheets = discover_stylesheets("http://127.0.0.1:9/", Duration::from_millis(200));

        assert_eq!(sheets, vec![FALLBACK_STYLESHEET]);
    }
}
