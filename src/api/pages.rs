//! Page routes for the front-end bundle.
//!
//! Every page is the same `index.html`; the bundle does its own routing.
//! Only the admin gate is enforced here.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::warn;

use super::error::ApiError;
use crate::auth::AuthContext;
use crate::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_PATH: &str = "/admin";

const INDEX_FILE: &str = "index.html";

async fn index(static_dir: &Path) -> Response {
    let path = static_dir.join(INDEX_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Front-end bundle not found");
            ApiError::not_found("Page not found").into_response()
        }
    }
}

/// `/admin` and everything below it, however the client spells the prefix.
fn is_admin_path(path: &str) -> bool {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .is_some_and(|first| first.eq_ignore_ascii_case(ADMIN_PATH.trim_start_matches('/')))
}

/// Redirect admin page requests to the login page unless a session is
/// present. Runs ahead of routing so the static fallback is covered too.
pub async fn admin_gate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_admin_path(request.uri().path()) {
        let ctx = AuthContext::resolve(request.headers(), &state)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not confirm session; treating request as logged out");
                AuthContext::default()
            });
        if !ctx.is_authenticated() {
            return Redirect::to(LOGIN_PATH).into_response();
        }
    }

    next.run(request).await
}

/// Public pages, and `/admin` once past the gate.
pub async fn public_page(State(state): State<Arc<AppState>>) -> Response {
    index(&state.config.server.static_dir).await
}

/// Already logged in: go straight to the admin panel.
pub async fn login_page(State(state): State<Arc<AppState>>, ctx: AuthContext) -> Response {
    if ctx.is_authenticated() {
        return Redirect::to(ADMIN_PATH).into_response();
    }
    index(&state.config.server.static_dir).await
}

/// Static assets with SPA fallback to `index.html`.
pub fn static_files(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join(INDEX_FILE)))
}
