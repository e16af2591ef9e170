//! Static file serving.
//!
//! Serves the bundled stylesheet from `mdview-assets`.

use std::sync::Arc;

use axum::Router;
use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::state::AppState;

/// Create router for `/css/*` assets.
pub(crate) fn css_router() -> Router<Arc<AppState>> {
    Router::new().route("/css/{*path}", get(serve_css))
}

/// Serve a bundled stylesheet asset.
async fn serve_css(Path(path): Path<String>) -> Response {
    let asset = format!("css/{path}");

    match mdview_assets::get(&asset) {
        Some(content) => (
            [(header::CONTENT_TYPE, mdview_assets::mime_for(&asset))],
            content.into_owned(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
