//! Developer-record flow: list, create, update and delete developer
//! profiles through the data service.
//!
//! Each operation is one independent remote call. Updates overwrite every
//! writable column with no version check, so concurrent edits resolve as
//! last writer wins.

pub mod form;
pub mod skills;

pub use form::{parse_int_field, parse_rating, DeveloperForm};

use tracing::{error, info};

use crate::datastore::{DataError, DataService, DeveloperProfile};
use crate::error::FlowError;

const LOAD_FAILED: &str = "Failed to load developers";
const SAVE_FAILED: &str = "Failed to save developer";
const DELETE_FAILED: &str = "Failed to delete developer";

/// Surface a data service failure, passing the service's message through
/// when it gave one.
fn remote_error(err: DataError, fallback: &str) -> FlowError {
    FlowError::remote(err.service_message().unwrap_or(fallback))
}

pub struct DeveloperService<'a> {
    data: &'a dyn DataService,
}

impl<'a> DeveloperService<'a> {
    pub fn new(data: &'a dyn DataService) -> Self {
        Self { data }
    }

    /// All developers, newest first.
    pub async fn list(&self) -> Result<Vec<DeveloperProfile>, FlowError> {
        self.data.list_developers().await.map_err(|e| {
            error!(error = %e, "Failed to load developers");
            remote_error(e, LOAD_FAILED)
        })
    }

    pub async fn create(&self, form: DeveloperForm) -> Result<DeveloperProfile, FlowError> {
        let record = form.into_record()?;

        let profile = self.data.insert_developer(&record).await.map_err(|e| {
            error!(error = %e, full_name = %record.full_name, "Failed to create developer");
            remote_error(e, SAVE_FAILED)
        })?;

        info!(developer_id = %profile.id, full_name = %profile.record.full_name, "Developer created");
        Ok(profile)
    }

    pub async fn update(&self, id: &str, form: DeveloperForm) -> Result<DeveloperProfile, FlowError> {
        let record = form.into_record()?;

        let profile = self.data.update_developer(id, &record).await.map_err(|e| {
            error!(error = %e, developer_id = %id, "Failed to update developer");
            remote_error(e, SAVE_FAILED)
        })?;

        info!(developer_id = %id, "Developer updated");
        Ok(profile)
    }

    /// Confirmation is the caller's job; this removes the row outright.
    pub async fn delete(&self, id: &str) -> Result<(), FlowError> {
        self.data.delete_developer(id).await.map_err(|e| {
            error!(error = %e, developer_id = %id, "Failed to delete developer");
            remote_error(e, DELETE_FAILED)
        })?;

        info!(developer_id = %id, "Developer deleted");
        Ok(())
    }
}
