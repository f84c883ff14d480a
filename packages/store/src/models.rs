//! # Domain models for users, notes and folders
//!
//! Defines the data structures exchanged between the HTTP API and its clients.
//! Every type is `Serialize + Deserialize` and uses camelCase field names on the
//! wire (`userId`, `folderId`, `parentId`, `createdAt`, ...).
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`UserInfo`] | A registered user without the password hash. |
//! | [`Registration`] / [`LoginCredentials`] / [`AuthTokens`] | Auth request and response bodies. |
//! | [`Note`] | A note owned by a user. `content` is an opaque serialized block document. |
//! | [`NoteCreate`] / [`NotePatch`] | Create and partial-update payloads for notes. |
//! | [`Folder`] | A folder in the user's hierarchy, optionally carrying a note count and breadcrumb path. |
//! | [`FolderCreate`] / [`FolderPatch`] | Create and partial-update payloads for folders. |
//! | [`FolderPathEntry`] | One ancestor in a breadcrumb path. |
//! | [`FolderFilter`] | "All", "root only" or "inside this folder" scoping for list queries. |
//!
//! ## Partial updates
//!
//! Patch payloads distinguish three states for nullable fields: absent (leave
//! unchanged), `null` (clear) and a value (set). They are modelled as
//! `Option<Option<T>>` with [`double_option`] as the deserializer, and absent
//! fields are skipped on serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// User information safe to send to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /auth/register`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Response of a successful login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
}

/// A note as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    /// Serialized block document. Never interpreted by the backend.
    pub content: String,
    pub folder_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /notes`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Uuid>,
}

/// Body of `PATCH /notes/{id}`. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePatch {
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub folder_id: Option<Option<Uuid>>,
}

impl NotePatch {
    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.folder_id.is_none()
    }
}

/// One ancestor in a breadcrumb path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPathEntry {
    pub id: Uuid,
    pub name: String,
    pub depth: i32,
}

/// A folder as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    /// Number of ancestors; 0 for a root folder.
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the request asked for note counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_count: Option<i64>,
    /// Ancestors from root to immediate parent, when the request asked for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<FolderPathEntry>>,
}

impl Folder {
    pub fn path_entry(&self) -> FolderPathEntry {
        FolderPathEntry {
            id: self.id,
            name: self.name.clone(),
            depth: self.depth,
        }
    }
}

/// Body of `POST /folders`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

/// Body of `PATCH /folders/{id}`. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<Uuid>>,
}

/// Scope of a note or folder listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FolderFilter {
    /// Everything the user owns.
    #[default]
    All,
    /// Only rows without a folder (notes) or parent (folders).
    Root,
    /// Only rows directly inside the given folder.
    In(Uuid),
}

impl FolderFilter {
    /// Parse the `folderId` / `parentId` query value: `"root"` or a UUID.
    pub fn parse(value: Option<&str>) -> Result<Self, uuid::Error> {
        match value {
            None | Some("") => Ok(Self::All),
            Some("root") => Ok(Self::Root),
            Some(id) => Uuid::parse_str(id).map(Self::In),
        }
    }

    /// The query value understood by [`FolderFilter::parse`].
    pub fn to_query(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Root => Some("root".to_string()),
            Self::In(id) => Some(id.to_string()),
        }
    }

    /// Whether a row whose folder (or parent) is `folder` falls inside this scope.
    pub fn matches(&self, folder: Option<Uuid>) -> bool {
        match self {
            Self::All => true,
            Self::Root => folder.is_none(),
            Self::In(id) => folder == Some(*id),
        }
    }
}

/// Deserialize a present field (including `null`) as `Some(..)`, so that
/// `#[serde(default)]` can represent an absent field as `None`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
