//! # Persistence
//!
//! Every handler talks to storage through the [`NoteStore`] trait, held in
//! [`crate::AppState`] as an `Arc<dyn NoteStore>`. Two implementations exist:
//!
//! | Type | Backing | Used by |
//! |------|---------|---------|
//! | [`PgStore`] | PostgreSQL via a shared `sqlx::PgPool` | the server binary |
//! | [`MemoryStore`] | `HashMap`s behind a mutex | tests and local experiments |
//!
//! All note and folder operations take the owner's user id and behave as if rows
//! of other users did not exist. Deletes are soft: rows get a `deleted_at`
//! timestamp and disappear from every read.

mod memory;
mod pool;
mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use store::{
    Folder, FolderCreate, FolderFilter, FolderPatch, FolderPathEntry, Note, NoteCreate, NotePatch,
};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

pub use memory::MemoryStore;
pub use pool::{connect, run_migrations};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidReference(String),
    #[error("folder would become its own ancestor")]
    Cycle,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) const NOTE: &str = "Note";
pub(crate) const FOLDER: &str = "Folder";
pub(crate) const DUPLICATE_USER: &str = "Username or email already exists";
pub(crate) const MISSING_FOLDER: &str = "Folder does not exist";
pub(crate) const MISSING_PARENT: &str = "Parent folder does not exist";

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Notes ordered by most recently updated first.
    async fn list_notes(&self, owner: Uuid, filter: FolderFilter) -> Result<Vec<Note>, StoreError>;
    async fn get_note(&self, owner: Uuid, id: Uuid) -> Result<Note, StoreError>;
    async fn create_note(&self, owner: Uuid, create: NoteCreate) -> Result<Note, StoreError>;
    async fn patch_note(&self, owner: Uuid, id: Uuid, patch: NotePatch) -> Result<Note, StoreError>;
    async fn delete_note(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError>;
    /// Live notes per folder; folders without notes are absent.
    async fn note_counts(&self, owner: Uuid) -> Result<HashMap<Uuid, i64>, StoreError>;

    /// Folders ordered by name, then depth.
    async fn list_folders(&self, owner: Uuid, parent: FolderFilter) -> Result<Vec<Folder>, StoreError>;
    async fn get_folder(&self, owner: Uuid, id: Uuid) -> Result<Folder, StoreError>;
    /// Ancestors of a folder, root first, excluding the folder itself.
    async fn folder_path(&self, owner: Uuid, id: Uuid) -> Result<Vec<FolderPathEntry>, StoreError>;
    async fn create_folder(&self, owner: Uuid, create: FolderCreate) -> Result<Folder, StoreError>;
    /// Renames and/or moves a folder. Moving recomputes the depth of its subtree.
    async fn patch_folder(&self, owner: Uuid, id: Uuid, patch: FolderPatch) -> Result<Folder, StoreError>;
    /// Soft-deletes a folder and detaches its notes and child folders to the root.
    async fn delete_folder(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError>;
}
