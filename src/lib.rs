pub mod api;
pub mod auth;
pub mod config;
pub mod contact;
pub mod datastore;
pub mod developers;
pub mod error;

use auth::session::RevokedSessions;
use config::Config;
use datastore::DataService;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub data: Arc<dyn DataService>,
    /// HMAC key for the session cookie
    pub session_key: Vec<u8>,
    /// Sessions ended by logout
    pub revoked_sessions: RevokedSessions,
}

impl AppState {
    pub fn new(config: Config, data: Arc<dyn DataService>) -> Self {
        let session_key = config.session_key();
        Self {
            config,
            data,
            session_key,
            revoked_sessions: RevokedSessions::default(),
        }
    }
}
