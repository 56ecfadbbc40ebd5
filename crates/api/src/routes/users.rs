//! User profile endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use common::UserId;
use serde::Serialize;
use store::{MarketStore, User, UserPatch};

use super::auth::CurrentUser;
use crate::error::ApiError;
use crate::AppState;

/// A user as presented over the wire; never carries the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            address: user.address,
            profile_image: user.profile_image,
            is_active: user.is_active,
            is_verified: user.is_verified,
        }
    }
}

/// GET /api/v1/users/profile — the caller's own profile.
pub async fn profile<S: MarketStore + Clone + 'static>(
    CurrentUser(user): CurrentUser,
) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// PUT /api/v1/users/profile — partial update of the caller's profile.
#[tracing::instrument(skip(state, user, patch))]
pub async fn update_profile<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .directory
        .update(user.id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::from(updated)))
}

/// GET /api/v1/users/{id} — a user's profile by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .directory
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserResponse::from(user)))
}
