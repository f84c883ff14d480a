//! Folder CRUD plus the tree and breadcrumb views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use store::validation::normalize_folder_name;
use store::{build_tree, Folder, FolderCreate, FolderFilter, FolderPatch, FolderTreeNode};

use super::FolderQuery;
use crate::auth::AuthUser;
use crate::db::FOLDER;
use crate::error::ApiError;
use crate::extract::{parse_id, Payload};
use crate::AppState;

/// Folders ordered by name, then depth. `noteCount=true` attaches live note counts.
pub async fn list(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<Folder>>, ApiError> {
    let parent = FolderFilter::parse(query.parent_id.as_deref())
        .map_err(|_| ApiError::Validation("Invalid parent id".to_string()))?;
    let mut folders = state.store.list_folders(user_id, parent).await?;

    if query.with_note_count() {
        let counts = state.store.note_counts(user_id).await?;
        for folder in &mut folders {
            folder.note_count = Some(counts.get(&folder.id).copied().unwrap_or(0));
        }
    }
    Ok(Json(folders))
}

/// The user's whole hierarchy as a sorted forest with note counts.
pub async fn tree(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<FolderTreeNode>>, ApiError> {
    let folders = state.store.list_folders(user_id, FolderFilter::All).await?;
    let counts = state.store.note_counts(user_id).await?;
    Ok(Json(build_tree(folders, &counts)?))
}

pub async fn create(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Payload(mut create): Payload<FolderCreate>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    create.name = normalize_folder_name(&create.name)?;

    let folder = state.store.create_folder(user_id, create).await?;
    tracing::debug!(folder_id = %folder.id, depth = folder.depth, %user_id, "created folder");
    Ok((StatusCode::CREATED, Json(folder)))
}

/// A single folder. `noteCount=true` attaches its note count and `path=true` its
/// ancestors from the root down to the immediate parent.
pub async fn show(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Folder>, ApiError> {
    let id = parse_id(id, FOLDER)?;
    let mut folder = state.store.get_folder(user_id, id).await?;

    if query.with_note_count() {
        let counts = state.store.note_counts(user_id).await?;
        folder.note_count = Some(counts.get(&id).copied().unwrap_or(0));
    }
    if query.with_path() {
        folder.path = Some(state.store.folder_path(user_id, id).await?);
    }
    Ok(Json(folder))
}

/// Rename and/or move. `parentId: null` moves the folder to the root.
pub async fn update(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
    Payload(mut patch): Payload<FolderPatch>,
) -> Result<Json<Folder>, ApiError> {
    let id = parse_id(id, FOLDER)?;
    if let Some(name) = patch.name.as_deref() {
        patch.name = Some(normalize_folder_name(name)?);
    }

    let folder = state.store.patch_folder(user_id, id, patch).await?;
    Ok(Json(folder))
}

/// Soft delete. Notes and child folders move to the root.
pub async fn destroy(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    id: Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(id, FOLDER)?;
    state.store.delete_folder(user_id, id).await?;
    tracing::debug!(folder_id = %id, %user_id, "deleted folder");
    Ok(StatusCode::NO_CONTENT)
}
