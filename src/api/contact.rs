use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::contact::{self, ContactForm};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub clear_form: bool,
}

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(form): Json<ContactForm>,
) -> Result<Json<ContactResponse>, ApiError> {
    let outcome = contact::submit(state.data.as_ref(), &form).await?;
    Ok(Json(ContactResponse {
        success: true,
        clear_form: outcome.clear_form,
    }))
}
