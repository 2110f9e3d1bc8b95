use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::AdminSession;
use crate::datastore::DeveloperProfile;
use crate::developers::{DeveloperForm, DeveloperService};
use crate::AppState;

/// List developers, newest first. Public.
pub async fn list_developers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeveloperProfile>>, ApiError> {
    let developers = DeveloperService::new(state.data.as_ref()).list().await?;
    Ok(Json(developers))
}

pub async fn create_developer(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Json(form): Json<DeveloperForm>,
) -> Result<(StatusCode, Json<DeveloperProfile>), ApiError> {
    let developer = DeveloperService::new(state.data.as_ref()).create(form).await?;
    Ok((StatusCode::CREATED, Json(developer)))
}

pub async fn update_developer(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(id): Path<String>,
    Json(form): Json<DeveloperForm>,
) -> Result<Json<DeveloperProfile>, ApiError> {
    let developer = DeveloperService::new(state.data.as_ref())
        .update(&id, form)
        .await?;
    Ok(Json(developer))
}

pub async fn delete_developer(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    DeveloperService::new(state.data.as_ref()).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
