//! Bearer-token extractor.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated user, taken from `Authorization: Bearer <jwt>`.
///
/// Place it before any body extractor so that a missing or invalid token is
/// reported as 401 regardless of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(ApiError::unauthorized)?;

        match state.tokens.verify(token) {
            Some(user_id) => Ok(Self(user_id)),
            None => {
                tracing::debug!("rejected bearer token");
                Err(ApiError::unauthorized())
            }
        }
    }
}
