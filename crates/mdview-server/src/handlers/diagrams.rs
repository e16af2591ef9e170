//! Rendered diagram endpoint.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /__diagram__/{key}.
pub(crate) async fn get_diagram(
    Path(key): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let diagram = state.cache.lookup(&key)?;

    Ok(([(header::CONTENT_TYPE, diagram.content_type)], diagram.payload))
}
