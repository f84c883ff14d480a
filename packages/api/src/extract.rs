//! Request extractors that reject with [`ApiError`] instead of axum's plain-text rejections.

use axum::extract::{FromRequest, Path, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON request body. Malformed or mistyped bodies become `400` with a JSON error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Parse an `{id}` path segment; ids that are not UUIDs cannot name an existing row.
pub fn parse_id(Path(id): Path<String>, what: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(what))
}
