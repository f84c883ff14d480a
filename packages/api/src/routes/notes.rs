//! Note CRUD, scoped to the authenticated user.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use store::validation::{normalize_title, validate_note_create, validate_note_patch};
use store::{FolderFilter, Note, NoteCreate, NotePatch};

use super::NoteQuery;
use crate::auth::AuthUser;
use crate::db::NOTE;
use crate::error::ApiError;
use crate::extract::{parse_id, Payload};
use crate::AppState;

pub async fn list(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let filter = FolderFilter::parse(query.folder_id.as_deref())
        .map_err(|_| ApiError::Validation("Invalid folder id".to_string()))?;
    let notes = state.store.list_notes(user_id, filter).await?;
    Ok(Json(notes))
}

pub async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Payload(mut create): Payload<NoteCreate>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    validate_note_create(&create)?;
    create.title = normalize_title(create.title);

    let note = state.store.create_note(user_id, create).await?;
    tracing::debug!(note_id = %note.id, %user_id, "created note");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn show(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(id, NOTE)?;
    Ok(Json(state.store.get_note(user_id, id).await?))
}

/// Partial update. Only fields present in the body change; `title: null` clears
/// the title and `folderId: null` moves the note to the root.
pub async fn update(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
    Payload(mut patch): Payload<NotePatch>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_id(id, NOTE)?;
    validate_note_patch(&patch)?;
    patch.title = patch.title.map(normalize_title);

    if patch.is_empty() {
        return Ok(Json(state.store.get_note(user_id, id).await?));
    }
    let note = state.store.patch_note(user_id, id, patch).await?;
    Ok(Json(note))
}

pub async fn destroy(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(id, NOTE)?;
    state.store.delete_note(user_id, id).await?;
    tracing::debug!(note_id = %id, %user_id, "deleted note");
    Ok(StatusCode::NO_CONTENT)
}
