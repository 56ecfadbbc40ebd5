//! Registration, login, and the bearer-session extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use domain::NewUser;
use serde::{Deserialize, Serialize};
use store::{MarketStore, User};

use super::users::UserResponse;
use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header via the session store.
///
/// Handlers downstream trust this identity; nothing re-verifies
/// credentials past this point.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<Arc<AppState<S>>> for CurrentUser
where
    S: MarketStore + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(could_not_validate)?;

        let user = state
            .directory
            .resolve_session(token)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(could_not_validate)?;

        Ok(CurrentUser(user))
    }
}

fn could_not_validate() -> ApiError {
    ApiError::Unauthorized("Could not validate credentials".to_string())
}

// -- Request/response types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.username.len() < 3 || req.username.len() > 20 {
        return Err(ApiError::BadRequest(
            "username must be between 3 and 20 characters".to_string(),
        ));
    }
    if !is_plausible_email(&req.email) {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

// -- Handlers --

/// POST /api/v1/auth/register — create a new user account.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_registration(&req)?;

    let user = state
        .directory
        .register(NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            phone: req.phone,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /api/v1/auth/login — authenticate and issue an access token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: MarketStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some(user) = state
        .directory
        .authenticate(&req.email, &req.password)
        .await?
    else {
        return Err(ApiError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    };

    let session = state.directory.open_session(&user).await?;
    Ok(Json(TokenResponse {
        access_token: session.token,
        token_type: "bearer".to_string(),
    }))
}

/// GET /api/v1/auth/me — current user information.
pub async fn me<S: MarketStore + Clone + 'static>(
    CurrentUser(user): CurrentUser,
) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
