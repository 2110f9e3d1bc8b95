//! The logged-in administrator and its client-side persistence.
//!
//! A session is a small JSON record kept in one cookie. The cookie value is
//! `base64url(json) "." hex(hmac_sha256(key, base64url(json)))`; a value that
//! fails the MAC check, does not decode, has expired or was logged out is
//! treated as no session at all.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::convert::Infallible;
use std::sync::Arc;
use time::Duration;
use tracing::warn;

use crate::api::error::ApiError;
use crate::datastore::{AdminCredential, DataError, DataService};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Cookie holding the serialized session.
pub const SESSION_COOKIE: &str = "admin_user";

const SESSION_TTL: Duration = Duration::days(7);

/// Current time as unix seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

impl From<AdminCredential> for Session {
    fn from(admin: AdminCredential) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            full_name: admin.full_name,
            role: admin.role,
        }
    }
}

/// What the cookie actually carries: the session plus an id and expiry so
/// the server can refuse it later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    #[serde(flatten)]
    pub user: Session,
    /// Random per-login id, used for logout
    pub sid: String,
    /// Unix seconds
    pub exp: i64,
}

impl SessionClaims {
    pub fn issue(user: Session, now: i64) -> Self {
        Self {
            user,
            sid: uuid::Uuid::new_v4().simple().to_string(),
            exp: now + SESSION_TTL.whole_seconds(),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }
}

/// Sessions ended by logout before their expiry. Entries are dropped once
/// the cookie would have expired anyway. Process-local.
#[derive(Debug, Default)]
pub struct RevokedSessions {
    entries: DashMap<String, i64>,
}

impl RevokedSessions {
    pub fn revoke(&self, claims: &SessionClaims, now: i64) {
        self.entries.retain(|_, exp| *exp > now);
        self.entries.insert(claims.sid.clone(), claims.exp);
    }

    pub fn is_revoked(&self, sid: &str) -> bool {
        self.entries.contains_key(sid)
    }
}

fn sign(key: &[u8], payload: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    Some(mac)
}

/// Serialize and sign session claims into a cookie value.
pub fn encode(claims: &SessionClaims, key: &[u8]) -> Option<String> {
    let json = serde_json::to_vec(claims).ok()?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = hex::encode(sign(key, &payload)?.finalize().into_bytes());
    Some(format!("{}.{}", payload, signature))
}

/// Verify and deserialize a cookie value. Expired claims are rejected.
pub fn decode(value: &str, key: &[u8], now: i64) -> Option<SessionClaims> {
    let (payload, signature) = value.rsplit_once('.')?;
    let expected = hex::decode(signature).ok()?;

    // Constant-time comparison
    sign(key, payload)?.verify_slice(&expected).ok()?;

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&json).ok()?;
    (!claims.is_expired(now)).then_some(claims)
}

/// Write the session cookie.
pub fn persist(jar: CookieJar, claims: &SessionClaims, key: &[u8]) -> Result<CookieJar, ApiError> {
    let value = encode(claims, key).ok_or_else(|| ApiError::internal("Failed to encode session"))?;
    let cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(SESSION_TTL)
        .build();
    Ok(jar.add(cookie))
}

/// Remove the session cookie. Never touches the data service.
pub fn clear(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Per-request view of who is logged in, rebuilt from the cookie.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    claims: Option<SessionClaims>,
}

impl AuthContext {
    /// Cookie checks only: signature, expiry and logout.
    pub fn from_jar(jar: &CookieJar, key: &[u8], revoked: &RevokedSessions, now: i64) -> Self {
        let claims = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| decode(cookie.value(), key, now))
            .filter(|claims| !revoked.is_revoked(&claims.sid));
        Self { claims }
    }

    /// Cookie checks, then confirm the admin row is still active.
    pub async fn resolve(headers: &HeaderMap, state: &AppState) -> Result<Self, DataError> {
        let jar = CookieJar::from_headers(headers);
        Self::from_jar(&jar, &state.session_key, &state.revoked_sessions, now_timestamp())
            .confirm_active(state.data.as_ref())
            .await
    }

    async fn confirm_active(self, data: &dyn DataService) -> Result<Self, DataError> {
        let Some(claims) = self.claims else {
            return Ok(Self::default());
        };

        let admin = data.find_active_admin(&claims.user.email).await?;
        if admin.is_some_and(|admin| admin.id == claims.user.id) {
            Ok(Self {
                claims: Some(claims),
            })
        } else {
            warn!(email = %claims.user.email, "Session refused: admin account no longer active");
            Ok(Self::default())
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.claims.as_ref().map(|claims| &claims.user)
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        self.claims.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    pub fn into_session(self) -> Option<Session> {
        self.claims.map(|claims| claims.user)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(&parts.headers, state).await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not confirm session; treating request as logged out");
            Self::default()
        }))
    }
}

/// Extractor for handlers that require a logged-in administrator.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::resolve(&parts.headers, state).await.map_err(|e| {
            warn!(error = %e, "Could not confirm session");
            ApiError::external_service("Authentication failed. Please try again.")
        })?;

        ctx.into_session()
            .map(AdminSession)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
