//! Profile endpoints for the signed-in user.

use axum::{extract::State, Extension, Json};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Identity, UpdateProfileRequest, UserProfile};
use crate::AppState;

/// GET /api/profile - The caller's stored profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<UserProfile> {
    let profile = state
        .repo
        .get_user(&identity.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity.uid)))?;

    success(profile)
}

/// PUT /api/profile - Update the caller's name and/or email.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name must not be empty".to_string()));
        }
    }
    if let Some(email) = &request.email {
        if email.trim().is_empty() {
            return Err(AppError::Validation("Email must not be empty".to_string()));
        }
    }

    let profile = state.repo.update_profile(&identity.uid, &request).await?;
    success(profile)
}

/// DELETE /api/profile - Delete the caller's account and sessions.
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<()> {
    state.repo.delete_user(&identity.uid).await?;
    success(())
}
