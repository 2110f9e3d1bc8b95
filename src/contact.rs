//! Contact-submission flow: one insert into `contacts`, never read back.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::datastore::{ContactSubmission, DataService};
use crate::error::FlowError;

const SEND_FAILED: &str = "Failed to send message. Please try again.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// What the caller should do with the form after a successful send.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ContactOutcome {
    pub clear_form: bool,
}

impl ContactForm {
    fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.message]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Validate locally, then insert. On failure the caller keeps the form
/// contents so the user can resubmit.
pub async fn submit(data: &dyn DataService, form: &ContactForm) -> Result<ContactOutcome, FlowError> {
    if !form.is_complete() {
        return Err(FlowError::validation("Please fill in all fields"));
    }

    let submission = ContactSubmission {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        message: form.message.trim().to_string(),
    };

    data.insert_contact(&submission).await.map_err(|e| {
        error!(error = %e, "Failed to store contact submission");
        FlowError::remote(SEND_FAILED)
    })?;

    info!(email = %submission.email, "Contact message received");
    Ok(ContactOutcome { clear_form: true })
}
