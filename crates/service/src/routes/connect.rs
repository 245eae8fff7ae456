//! Connect page route handler.
//!
//! Renders the TON Connect handshake page opened from the chat client. The
//! page does the wallet-provider exchange in the browser and reports the
//! resulting address back through `POST /submit`.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters of the connect page.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub nonce: String,
}

/// The handshake page.
#[derive(Template, WebTemplate)]
#[template(path = "connect.html")]
pub struct ConnectTemplate {
    uid: i64,
    nonce: String,
    manifest_url: String,
}

/// Render the connect page.
///
/// Both parameters are validated strictly before they are interpolated into
/// the page: `uid` numeric and positive, `nonce` a bounded hex token.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` (400) on malformed parameters.
pub async fn page(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Result<ConnectTemplate> {
    let uid = params
        .uid
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| AppError::InvalidInput("uid must be a positive integer".to_owned()))?;

    let nonce = params.nonce.trim();
    if nonce.is_empty() || nonce.len() > 64 || !nonce.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AppError::InvalidInput("nonce must be a hex token".to_owned()));
    }

    Ok(ConnectTemplate {
        uid,
        nonce: nonce.to_owned(),
        manifest_url: state.config().manifest_url(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_renders_parameters() {
        let page = ConnectTemplate {
            uid: 42,
            nonce: "abcd1234".to_owned(),
            manifest_url: "https://link.example.net/manifest".to_owned(),
        };

        let html = page.render().expect("render");
        assert!(html.contains("\"42\""));
        assert!(html.contains("abcd1234"));
        assert!(html.contains("https://link.example.net/manifest"));
    }
}
