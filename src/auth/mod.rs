//! Admin authentication.
//!
//! Credentials live in the data service's `admin_users` table; the password
//! column holds an Argon2 PHC string. A successful login yields a [`Session`]
//! which the HTTP layer persists client-side (see [`session`]).

pub mod session;

pub use session::{AdminSession, AuthContext, Session, SessionClaims, SESSION_COOKIE};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{error, info, warn};

use crate::datastore::DataService;
use crate::error::FlowError;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string. Anything that does not
/// parse as one never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => {
            warn!("Stored password is not an Argon2 PHC string; rejecting login");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Check `email`/`password` against the active admin rows.
///
/// Read-only on the data service; there is no lockout after repeated
/// failures.
pub async fn login(
    data: &dyn DataService,
    email: &str,
    password: &str,
) -> Result<Session, FlowError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(FlowError::validation("Please fill in all fields"));
    }

    let admin = data.find_active_admin(email).await.map_err(|e| {
        error!(error = %e, "Admin lookup failed");
        FlowError::remote("Authentication failed. Please try again.")
    })?;

    let Some(admin) = admin else {
        warn!(email = %email, "Login rejected: no active admin with this email");
        return Err(FlowError::NotFound);
    };

    if !verify_password(password, &admin.password_hash) {
        warn!(email = %email, "Login rejected: password mismatch");
        return Err(FlowError::InvalidCredential);
    }

    info!(email = %email, admin_id = %admin.id, "Admin logged in");
    Ok(Session::from(admin))
}
