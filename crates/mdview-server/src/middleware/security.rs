//! Security headers middleware.
//!
//! Every response carries `X-Content-Type-Options: nosniff` and
//! `X-Frame-Options: DENY`. There is no Content-Security-Policy because pages
//! link stylesheets hosted by GitHub.

use axum::http::HeaderValue;
use axum::http::header::{HeaderName, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use tower_http::set_header::SetResponseHeaderLayer;

/// Layer that sets `name: value` on every response, replacing handler values.
fn overriding(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

/// Forbid MIME sniffing of raw files served from the preview root.
pub(crate) fn content_type_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    overriding(X_CONTENT_TYPE_OPTIONS, "nosniff")
}

/// Forbid embedding previews in frames.
pub(crate) fn frame_options_layer() -> SetResponseHeaderLayer<HeaderValue> {
    overriding(X_FRAME_OPTIONS, "DENY")
}
