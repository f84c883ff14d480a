use axum::extract::State;
use axum::Json;
use store::UserInfo;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// `GET /users/@me`. A token for a user that no longer exists is treated as invalid.
pub async fn me(AuthUser(user_id): AuthUser, State(state): State<AppState>) -> Result<Json<UserInfo>, ApiError> {
    match state.store.user_by_id(user_id).await? {
        Some(user) => Ok(Json(user.to_info())),
        None => Err(ApiError::unauthorized()),
    }
}
