//! Request handlers, one module per resource.
//!
//! Handlers that need a user take [`crate::auth::AuthUser`] as their first
//! argument and any [`crate::extract::Payload`] last, so authentication is
//! checked before the body is read.

pub mod auth;
pub mod folders;
pub mod notes;
pub mod users;

use serde::Deserialize;

/// Boolean query flags are only set by the literal value `true`.
fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteQuery {
    pub folder_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderQuery {
    pub parent_id: Option<String>,
    pub note_count: Option<String>,
    pub path: Option<String>,
}

impl FolderQuery {
    pub fn with_note_count(&self) -> bool {
        flag(self.note_count.as_deref())
    }

    pub fn with_path(&self) -> bool {
        flag(self.path.as_deref())
    }
}
