//! TON Connect manifest route handlers.
//!
//! Wallet apps fetch the manifest to learn who is asking for a connection.
//! Some wallet webviews cache very aggressively, so the manifest is served
//! with every anti-cache header that has ever been observed to matter, and
//! the connect page appends a cache-defeating query parameter on top.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// Inline 1x1 PNG used as the manifest icon.
const ICON_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
    0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60, 0x00, 0x00, 0x02,
    0x00, 0x01, 0x54, 0xA2, 0x4F, 0x65, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
    0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Build the manifest JSON body.
fn manifest_body(base_url: &str) -> String {
    serde_json::json!({
        "url": base_url,
        "name": "TonLink",
        "iconUrl": format!("{base_url}/static/icon.png"),
        "termsOfUseUrl": format!("{base_url}/terms"),
        "privacyPolicyUrl": format!("{base_url}/privacy"),
    })
    .to_string()
}

/// Serve the TON Connect manifest.
///
/// `Cache-Control: no-store` keeps intermediaries from serving a stale
/// descriptor; the connect page additionally busts caches with `?v=nonce`.
pub async fn manifest(State(state): State<AppState>) -> Response {
    let body = manifest_body(&state.config().public_base_url);

    (
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "no-store, no-cache, must-revalidate, max-age=0",
            ),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        body,
    )
        .into_response()
}

/// Serve the inline manifest icon. Long cache is fine here.
pub async fn icon() -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        ICON_PNG,
    )
        .into_response()
}
