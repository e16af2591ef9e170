//! Scripted rendering engine for tests.
//!
//! Enabled with the `mock` feature. The engine understands a few directives
//! inside the diagram source:
//!
//! - empty source fails with "No diagram type detected"
//! - a source containing `invalid` fails with a parse error and stack frames
//! - a line `%% delay <ms>` delays completion by that many milliseconds
//! - a line `accTitle: <text>` adds an XML-escaped `<title>` element to the SVG
//!
//! Each finished render appends its label (the `accTitle`, else the source)
//! to [`MockStats::completions`].

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::escape::partial_escape;

use crate::engine::{EngineLauncher, RenderEngine};
use crate::error::EngineError;

/// Counters shared between a [`MockLauncher`], its engine, and the test.
#[derive(Debug, Default)]
pub struct MockStats {
    launches: AtomicUsize,
    renders: AtomicUsize,
    shutdowns: AtomicUsize,
    completions: Mutex<Vec<String>>,
}

impl MockStats {
    /// Number of launch attempts.
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Number of render calls.
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Number of shutdown calls.
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Labels of finished renders, in completion order.
    pub fn completions(&self) -> Vec<String> {
        self.completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn complete(&self, label: &str) {
        self.completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label.to_owned());
    }
}

/// Launcher for the scripted engine.
#[derive(Debug, Default)]
pub struct MockLauncher {
    stats: Arc<MockStats>,
    fail_launch: bool,
    launch_delay: Duration,
}

impl MockLauncher {
    /// Launcher whose engine renders every valid diagram.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launcher that always fails to start.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    /// Delay each launch by `delay`.
    #[must_use]
    pub fn launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    /// Counters for this launcher and the engines it starts.
    #[must_use]
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl EngineLauncher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderEngine>, EngineError> {
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.launch_delay).await;
        if self.fail_launch {
            return Err(EngineError::Launch("mock browser unavailable".to_owned()));
        }
        Ok(Box::new(MockEngine {
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct MockEngine {
    stats: Arc<MockStats>,
}

#[async_trait]
impl RenderEngine for MockEngine {
    async fn render(&self, source: &str) -> Result<String, EngineError> {
        self.stats.renders.fetch_add(1, Ordering::SeqCst);

        if let Some(ms) = directive(source, "%% delay").and_then(|v| v.parse().ok()) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.stats
            .complete(directive(source, "accTitle:").unwrap_or(source));

        if source.trim().is_empty() {
            return Err(EngineError::Render(
                "Evaluation failed: No diagram type detected".to_owned(),
            ));
        }
        if source.contains("invalid") {
            let first = source.lines().next().unwrap_or_default();
            return Err(EngineError::Render(format!(
                "Parse error on line 1:\n{first}\n^\n    at Parser.parse (mermaid.js:1:100)\n    at render (mermaid.js:2:200)"
            )));
        }

        let title = directive(source, "accTitle:")
            .map(|t| format!("<title>{}</title>", partial_escape(t)))
            .unwrap_or_default();
        Ok(format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100">{title}<g>{}</g></svg>"#,
            source.len()
        ))
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn directive<'a>(source: &'a str, prefix: &str) -> Option<&'a str> {
    source
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix))
        .map(str::trim)
}
