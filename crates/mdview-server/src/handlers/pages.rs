//! Page handler.
//!
//! Renders Markdown files (with diagrams) into HTML pages, lists directories,
//! and serves other files raw.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Uri, header};
use axum::response::{Html, IntoResponse, Response};

use crate::error::ServerError;
use crate::listing::{self, Target};
use crate::state::AppState;
use crate::template;

/// Body shown for a directory without a README.
const NO_README: &str = "No readme found";

/// Handle every request not matched by another route.
pub(crate) async fn get_page(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    if let Some(file) = &state.single_file {
        let text = read_text(file).await?;
        let html = render_markdown(&state, text).await?;
        return Ok(Html(template::render_page(&state.stylesheets, None, &html)).into_response());
    }

    let url_path = uri.path().to_owned();
    let root = state.root.clone();
    let lookup_path = url_path.clone();
    let target = tokio::task::spawn_blocking(move || listing::lookup(&root, &lookup_path))
        .await??
        .ok_or(ServerError::NotFound(url_path))?;

    match target {
        Target::Directory { readme, entries } => {
            let text = match readme {
                Some(readme) => read_text(&readme).await?,
                None => NO_README.to_owned(),
            };
            let html = render_markdown(&state, text).await?;
            Ok(Html(template::render_page(
                &state.stylesheets,
                Some(&entries),
                &html,
            ))
            .into_response())
        }
        Target::Markdown(path) => {
            let text = read_text(&path).await?;
            let html = render_markdown(&state, text).await?;
            Ok(Html(template::render_page(&state.stylesheets, None, &html)).into_response())
        }
        Target::File(path) => {
            let bytes = tokio::fs::read(&path).await?;
            let mime = mdview_assets::mime_for(&path.to_string_lossy());
            Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
        }
    }
}

/// Run the diagram pipeline, then convert Markdown to HTML off the runtime.
async fn render_markdown(state: &AppState, text: String) -> Result<String, ServerError> {
    let text = match &state.diagrams {
        Some(processor) => processor.process(&text).await?,
        None => text,
    };

    let markdown = Arc::clone(&state.markdown);
    Ok(tokio::task::spawn_blocking(move || markdown.render(&text)).await?)
}

/// Read a text file, replacing invalid UTF-8.
async fn read_text(path: &Path) -> Result<String, ServerError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(ServerError::NotFound(path.display().to_string()))
        }
        Err(err) => Err(err.into()),
    }
}
