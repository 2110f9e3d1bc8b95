pub mod auth;
mod contact;
mod developers;
pub mod error;
mod pages;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use pages::{ADMIN_PATH, LOGIN_PATH};

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::current_session));

    // Writes check for an admin session in the handlers
    let api_routes = Router::new()
        .route("/developers", get(developers::list_developers))
        .route("/developers", post(developers::create_developer))
        .route("/developers/:id", put(developers::update_developer))
        .route("/developers/:id", delete(developers::delete_developer))
        .route("/contact", post(contact::submit_contact));

    let page_routes = Router::new()
        .route("/", get(pages::public_page))
        .route("/about", get(pages::public_page))
        .route("/developers", get(pages::public_page))
        .route("/contact", get(pages::public_page))
        .route(LOGIN_PATH, get(pages::login_page))
        .route(ADMIN_PATH, get(pages::public_page));

    let static_files = pages::static_files(&state.config.server.static_dir);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .merge(page_routes)
        .fallback_service(static_files)
        // Covers `/admin/...` paths that only the static fallback would match
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pages::admin_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
