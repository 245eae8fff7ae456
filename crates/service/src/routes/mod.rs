//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (DB ping)
//!
//! # Handshake
//! GET  /connect?uid&nonce       - TON Connect page (opened from the chat client)
//! GET  /manifest                - TON Connect manifest (no-store)
//! GET  /.well-known/tonconnect-manifest.json - Manifest alias
//! GET  /static/icon.png         - Manifest icon
//! POST /submit                  - Wallet submit: {uid, nonce, address, referral?}
//! GET  /submit                  - 405 with a usage hint
//!
//! # Registry
//! GET  /profile?uid             - Registration projection or {registered:false}
//! POST /unsubscribe             - Delete the user's row
//!
//! # Peer channel
//! POST /notify                  - Relay a message to a chat (shared secret)
//! ```

pub mod connect;
pub mod manifest;
pub mod notify;
pub mod profile;
pub mod submit;
pub mod unsubscribe;

use axum::http::{Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Create the application router.
///
/// CORS is permissive across the surface: wallet apps fetch the manifest
/// cross-origin, and aggressive webviews have been seen preflighting the
/// submit POST.
pub fn routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/connect", get(connect::page))
        .route("/manifest", get(manifest::manifest))
        .route(
            "/.well-known/tonconnect-manifest.json",
            get(manifest::manifest),
        )
        .route("/static/icon.png", get(manifest::icon))
        .route("/submit", post(submit::submit).get(submit::method_hint))
        .route("/profile", get(profile::profile))
        .route("/unsubscribe", post(unsubscribe::unsubscribe))
        .route("/notify", post(notify::notify))
        .layer(cors)
}
