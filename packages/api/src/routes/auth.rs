//! `POST /auth/register` and `POST /auth/login`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use store::validation::{validate_login, validate_registration};
use store::{AuthTokens, LoginCredentials, Registration, UserInfo};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::extract::Payload;
use crate::models::NewUser;
use crate::AppState;

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// Register a new user with username, email and password.
pub async fn register(
    State(state): State<AppState>,
    Payload(registration): Payload<Registration>,
) -> Result<(StatusCode, Json<UserInfo>), ApiError> {
    validate_registration(&registration)?;

    let password_hash =
        hash_password(&registration.password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = state
        .store
        .create_user(NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "registered user");
    Ok((StatusCode::CREATED, Json(user.to_info())))
}

/// Exchange a username and password for an access token.
pub async fn login(
    State(state): State<AppState>,
    Payload(credentials): Payload<LoginCredentials>,
) -> Result<Json<AuthTokens>, ApiError> {
    validate_login(&credentials)?;

    let user = state.store.user_by_username(&credentials.username).await?;
    let Some(user) = user else {
        tracing::warn!(username = %credentials.username, "login for unknown user");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };
    let Some(hash) = user.password_hash.as_deref() else {
        tracing::warn!(user_id = %user.id, "login for user without password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };

    let valid =
        verify_password(&credentials.password, hash).map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        tracing::warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let access_token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::debug!(user_id = %user.id, "issued access token");
    Ok(Json(AuthTokens { access_token }))
}
