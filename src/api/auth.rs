use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::auth::session::{self, now_timestamp};
use crate::auth::{self, AdminSession, AuthContext, Session, SessionClaims};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Session,
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user = auth::login(state.data.as_ref(), &request.email, &request.password).await?;
    let claims = SessionClaims::issue(user, now_timestamp());
    let jar = session::persist(jar, &claims, &state.session_key)?;

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: claims.user,
        }),
    ))
}

/// Drop the session cookie and refuse it from now on. Always succeeds.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let now = now_timestamp();
    let ctx = AuthContext::from_jar(&jar, &state.session_key, &state.revoked_sessions, now);
    if let Some(claims) = ctx.claims() {
        state.revoked_sessions.revoke(claims, now);
        info!(email = %claims.user.email, "Admin logged out");
    }

    (session::clear(jar), StatusCode::NO_CONTENT)
}

/// The current session, or 401 when there is none.
pub async fn current_session(AdminSession(user): AdminSession) -> Json<Session> {
    Json(user)
}
