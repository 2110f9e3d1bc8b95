//! The data service seam.
//!
//! All persistence is owned by a hosted relational service reached over a
//! request/response API; `RestDataService` talks to it. `SqliteDataService`
//! implements the same tables locally for development and tests.

pub mod models;
mod rest;
mod sqlite;

pub use models::*;
pub use rest::RestDataService;
pub use sqlite::SqliteDataService;

use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, DatastoreBackend};

#[derive(Debug, Error)]
pub enum DataError {
    /// The service answered with an error body.
    #[error("data service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The targeted row does not exist.
    #[error("{0}")]
    Missing(String),

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    /// Message suitable for passing through to the user, if the service
    /// provided one. Transport and driver errors have none.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            DataError::Service { message, .. } if !message.trim().is_empty() => {
                Some(message.as_str())
            }
            DataError::Missing(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;

/// Operations the site performs against the data service. Each call is an
/// independent request; nothing spans more than one row.
#[async_trait]
pub trait DataService: Send + Sync {
    /// The `admin_users` row for `email`, only if its active flag is set.
    async fn find_active_admin(&self, email: &str) -> DataResult<Option<AdminCredential>>;

    /// All developers, newest first.
    async fn list_developers(&self) -> DataResult<Vec<DeveloperProfile>>;

    async fn insert_developer(&self, record: &DeveloperRecord) -> DataResult<DeveloperProfile>;

    /// Overwrites every writable column. Fails with `DataError::Missing` when
    /// no row has this id.
    async fn update_developer(
        &self,
        id: &str,
        record: &DeveloperRecord,
    ) -> DataResult<DeveloperProfile>;

    /// Fails with `DataError::Missing` when no row has this id.
    async fn delete_developer(&self, id: &str) -> DataResult<()>;

    async fn insert_contact(&self, submission: &ContactSubmission) -> DataResult<()>;
}

/// Build the configured backend. Expects `config.validate()` to have passed.
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn DataService>> {
    match config.datastore.backend {
        DatastoreBackend::Rest => {
            let url = config
                .datastore
                .url
                .as_deref()
                .context("datastore.url is not set")?;
            let key = config
                .datastore
                .api_key
                .as_deref()
                .context("datastore.api_key is not set")?;

            info!(url = %url, "Using hosted data service");
            Ok(Arc::new(RestDataService::new(url, key)?))
        }
        DatastoreBackend::Sqlite => {
            let path = &config.datastore.sqlite_path;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory: {}", parent.display())
                })?;
            }

            info!(path = %path.display(), "Using local SQLite data store");
            let store = SqliteDataService::open(path).await?;

            if let (Some(email), Some(password)) = (
                config.auth.bootstrap_email.as_deref(),
                config.auth.bootstrap_password.as_deref(),
            ) {
                store
                    .ensure_admin(email, password, &config.auth.bootstrap_name)
                    .await?;
            }

            Ok(Arc::new(store))
        }
    }
}
