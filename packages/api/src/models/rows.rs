//! Database rows for notes and folders and their mapping to the wire models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use store::{Folder, Note};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct NoteRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl NoteRow {
    pub fn into_model(self) -> Note {
        Note {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            folder_id: self.folder_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FolderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FolderRow {
    pub fn into_model(self) -> Folder {
        Folder {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            parent_id: self.parent_id,
            depth: self.depth,
            created_at: self.created_at,
            updated_at: self.updated_at,
            note_count: None,
            path: None,
        }
    }
}
