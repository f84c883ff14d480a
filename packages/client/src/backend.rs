//! The write side of the API the autosave controller depends on.

use async_trait::async_trait;
use store::{Note, NoteCreate, NotePatch};
use uuid::Uuid;

use crate::error::ClientError;

#[async_trait]
pub trait NotesBackend: Send + Sync {
    async fn create_note(&self, create: NoteCreate) -> Result<Note, ClientError>;
    async fn patch_note(&self, id: Uuid, patch: NotePatch) -> Result<Note, ClientError>;
}

#[async_trait]
impl<T: NotesBackend + ?Sized> NotesBackend for std::sync::Arc<T> {
    async fn create_note(&self, create: NoteCreate) -> Result<Note, ClientError> {
        (**self).create_note(create).await
    }

    async fn patch_note(&self, id: Uuid, patch: NotePatch) -> Result<Note, ClientError> {
        (**self).patch_note(id, patch).await
    }
}
