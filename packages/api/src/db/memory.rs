use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use store::{
    Folder, FolderCreate, FolderFilter, FolderPatch, FolderPathEntry, Note, NoteCreate, NotePatch,
};
use uuid::Uuid;

use super::{
    NoteStore, StoreError, DUPLICATE_USER, FOLDER, MISSING_FOLDER, MISSING_PARENT, NOTE,
};
use crate::models::{FolderRow, NewUser, NoteRow, User};

/// In-memory NoteStore for testing.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    notes: HashMap<Uuid, NoteRow>,
    folders: HashMap<Uuid, FolderRow>,
}

impl Tables {
    fn live_note(&self, owner: Uuid, id: Uuid) -> Option<&NoteRow> {
        self.notes
            .get(&id)
            .filter(|n| n.user_id == owner && n.deleted_at.is_none())
    }

    fn live_folder(&self, owner: Uuid, id: Uuid) -> Option<&FolderRow> {
        self.folders
            .get(&id)
            .filter(|f| f.user_id == owner && f.deleted_at.is_none())
    }

    fn ensure_folder(&self, owner: Uuid, folder_id: Option<Uuid>) -> Result<(), StoreError> {
        match folder_id {
            Some(id) if self.live_folder(owner, id).is_none() => {
                Err(StoreError::InvalidReference(MISSING_FOLDER.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Whether `candidate` is `folder` itself or one of its descendants.
    fn is_within(&self, folder: Uuid, candidate: Uuid) -> bool {
        let mut current = Some(candidate);
        let mut hops = 0;
        while let Some(id) = current {
            if id == folder {
                return true;
            }
            hops += 1;
            if hops > self.folders.len() {
                return false;
            }
            current = self.folders.get(&id).and_then(|f| f.parent_id);
        }
        false
    }

    /// Recompute `depth` below `root` from the root's own depth.
    fn refresh_subtree_depth(&mut self, root: Uuid) {
        let now = Utc::now();
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            let Some(depth) = self.folders.get(&parent).map(|f| f.depth + 1) else {
                continue;
            };
            for folder in self.folders.values_mut() {
                if folder.parent_id == Some(parent) && folder.deleted_at.is_none() && folder.id != root {
                    if folder.depth != depth {
                        folder.depth = depth;
                        folder.updated_at = now;
                    }
                    stack.push(folder.id);
                }
            }
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables();
        if tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict(DUPLICATE_USER.to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: Some(user.password_hash),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn list_notes(&self, owner: Uuid, filter: FolderFilter) -> Result<Vec<Note>, StoreError> {
        let tables = self.tables();
        let mut rows: Vec<&NoteRow> = tables
            .notes
            .values()
            .filter(|n| n.user_id == owner && n.deleted_at.is_none() && filter.matches(n.folder_id))
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows.into_iter().cloned().map(NoteRow::into_model).collect())
    }

    async fn get_note(&self, owner: Uuid, id: Uuid) -> Result<Note, StoreError> {
        self.tables()
            .live_note(owner, id)
            .cloned()
            .map(NoteRow::into_model)
            .ok_or(StoreError::NotFound(NOTE))
    }

    async fn create_note(&self, owner: Uuid, create: NoteCreate) -> Result<Note, StoreError> {
        let mut tables = self.tables();
        tables.ensure_folder(owner, create.folder_id)?;
        let now = Utc::now();
        let row = NoteRow {
            id: Uuid::new_v4(),
            user_id: owner,
            title: create.title,
            content: create.content,
            folder_id: create.folder_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.notes.insert(row.id, row.clone());
        Ok(row.into_model())
    }

    async fn patch_note(&self, owner: Uuid, id: Uuid, patch: NotePatch) -> Result<Note, StoreError> {
        let mut tables = self.tables();
        if tables.live_note(owner, id).is_none() {
            return Err(StoreError::NotFound(NOTE));
        }
        if let Some(folder_id) = patch.folder_id {
            tables.ensure_folder(owner, folder_id)?;
        }
        let row = tables.notes.get_mut(&id).ok_or(StoreError::NotFound(NOTE))?;
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(content) = patch.content {
            row.content = content;
        }
        if let Some(folder_id) = patch.folder_id {
            row.folder_id = folder_id;
        }
        row.updated_at = Utc::now();
        Ok(row.clone().into_model())
    }

    async fn delete_note(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if tables.live_note(owner, id).is_none() {
            return Err(StoreError::NotFound(NOTE));
        }
        if let Some(row) = tables.notes.get_mut(&id) {
            row.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn note_counts(&self, owner: Uuid) -> Result<HashMap<Uuid, i64>, StoreError> {
        let tables = self.tables();
        let mut counts = HashMap::new();
        for note in tables
            .notes
            .values()
            .filter(|n| n.user_id == owner && n.deleted_at.is_none())
        {
            if let Some(folder_id) = note.folder_id {
                *counts.entry(folder_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn list_folders(&self, owner: Uuid, parent: FolderFilter) -> Result<Vec<Folder>, StoreError> {
        let tables = self.tables();
        let mut rows: Vec<&FolderRow> = tables
            .folders
            .values()
            .filter(|f| f.user_id == owner && f.deleted_at.is_none() && parent.matches(f.parent_id))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.depth.cmp(&b.depth)));
        Ok(rows.into_iter().cloned().map(FolderRow::into_model).collect())
    }

    async fn get_folder(&self, owner: Uuid, id: Uuid) -> Result<Folder, StoreError> {
        self.tables()
            .live_folder(owner, id)
            .cloned()
            .map(FolderRow::into_model)
            .ok_or(StoreError::NotFound(FOLDER))
    }

    async fn folder_path(&self, owner: Uuid, id: Uuid) -> Result<Vec<FolderPathEntry>, StoreError> {
        let tables = self.tables();
        let start = tables.live_folder(owner, id).ok_or(StoreError::NotFound(FOLDER))?;

        let mut path = Vec::new();
        let mut next = start.parent_id;
        while let Some(parent) = next.and_then(|p| tables.live_folder(owner, p)) {
            if path.len() > tables.folders.len() {
                break;
            }
            path.push(FolderPathEntry {
                id: parent.id,
                name: parent.name.clone(),
                depth: parent.depth,
            });
            next = parent.parent_id;
        }
        path.reverse();
        Ok(path)
    }

    async fn create_folder(&self, owner: Uuid, create: FolderCreate) -> Result<Folder, StoreError> {
        let mut tables = self.tables();
        let depth = match create.parent_id {
            Some(parent_id) => {
                tables
                    .live_folder(owner, parent_id)
                    .ok_or_else(|| StoreError::InvalidReference(MISSING_PARENT.to_string()))?
                    .depth
                    + 1
            }
            None => 0,
        };
        let now = Utc::now();
        let row = FolderRow {
            id: Uuid::new_v4(),
            user_id: owner,
            name: create.name,
            parent_id: create.parent_id,
            depth,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.folders.insert(row.id, row.clone());
        Ok(row.into_model())
    }

    async fn patch_folder(&self, owner: Uuid, id: Uuid, patch: FolderPatch) -> Result<Folder, StoreError> {
        let mut tables = self.tables();
        let existing = tables
            .live_folder(owner, id)
            .cloned()
            .ok_or(StoreError::NotFound(FOLDER))?;

        let (parent_id, depth) = match patch.parent_id {
            None => (existing.parent_id, existing.depth),
            Some(None) => (None, 0),
            Some(Some(parent_id)) => {
                let parent_depth = tables
                    .live_folder(owner, parent_id)
                    .map(|p| p.depth)
                    .ok_or_else(|| StoreError::InvalidReference(MISSING_PARENT.to_string()));
                if parent_id == id || tables.is_within(id, parent_id) {
                    return Err(StoreError::Cycle);
                }
                (Some(parent_id), parent_depth? + 1)
            }
        };

        let row = tables.folders.get_mut(&id).ok_or(StoreError::NotFound(FOLDER))?;
        if let Some(name) = patch.name {
            row.name = name;
        }
        row.parent_id = parent_id;
        row.depth = depth;
        row.updated_at = Utc::now();
        let updated = row.clone();

        if depth != existing.depth {
            tables.refresh_subtree_depth(id);
        }
        Ok(updated.into_model())
    }

    async fn delete_folder(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if tables.live_folder(owner, id).is_none() {
            return Err(StoreError::NotFound(FOLDER));
        }
        let now = Utc::now();
        if let Some(folder) = tables.folders.get_mut(&id) {
            folder.deleted_at = Some(now);
        }

        for note in tables.notes.values_mut() {
            if note.user_id == owner && note.folder_id == Some(id) {
                note.folder_id = None;
                note.updated_at = now;
            }
        }

        let mut children = Vec::new();
        for folder in tables.folders.values_mut() {
            if folder.user_id == owner && folder.parent_id == Some(id) && folder.deleted_at.is_none() {
                folder.parent_id = None;
                folder.depth = 0;
                folder.updated_at = now;
                children.push(folder.id);
            }
        }
        for child in children {
            tables.refresh_subtree_depth(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, name: &str) -> Uuid {
        store
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn folder(store: &MemoryStore, owner: Uuid, name: &str, parent: Option<Uuid>) -> Folder {
        store
            .create_folder(
                owner,
                FolderCreate {
                    name: name.to_string(),
                    parent_id: parent,
                },
            )
            .await
            .unwrap()
    }

    async fn note(store: &MemoryStore, owner: Uuid, folder_id: Option<Uuid>) -> Note {
        store
            .create_note(
                owner,
                NoteCreate {
                    title: None,
                    content: "[]".to_string(),
                    folder_id,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_user_is_conflict() {
        let store = MemoryStore::new();
        user(&store, "alice").await;
        let err = store
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_depth_follows_parent() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let a = folder(&store, owner, "a", None).await;
        let b = folder(&store, owner, "b", Some(a.id)).await;
        let c = folder(&store, owner, "c", Some(b.id)).await;
        assert_eq!((a.depth, b.depth, c.depth), (0, 1, 2));

        let path = store.folder_path(owner, c.id).await.unwrap();
        let names: Vec<_> = path.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_move_recomputes_subtree_depth() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let a = folder(&store, owner, "a", None).await;
        let b = folder(&store, owner, "b", None).await;
        let c = folder(&store, owner, "c", Some(b.id)).await;

        let moved = store
            .patch_folder(
                owner,
                b.id,
                FolderPatch {
                    name: None,
                    parent_id: Some(Some(a.id)),
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.depth, 1);
        assert_eq!(store.get_folder(owner, c.id).await.unwrap().depth, 2);
    }

    #[tokio::test]
    async fn test_move_refreshes_chain_deeper_than_limit() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let top = folder(&store, owner, "top", None).await;
        let root = folder(&store, owner, "root", None).await;
        let mut leaf = root.clone();
        for level in 1..300 {
            leaf = folder(&store, owner, &format!("level {level}"), Some(leaf.id)).await;
        }
        assert_eq!(leaf.depth, 299);

        store
            .patch_folder(
                owner,
                root.id,
                FolderPatch {
                    name: None,
                    parent_id: Some(Some(top.id)),
                },
            )
            .await
            .unwrap();
        assert_eq!(store.get_folder(owner, leaf.id).await.unwrap().depth, 300);
    }

    #[tokio::test]
    async fn test_crossed_moves_cannot_both_succeed() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let a = folder(&store, owner, "a", None).await;
        let b = folder(&store, owner, "b", None).await;

        let a_under_b = FolderPatch {
            name: None,
            parent_id: Some(Some(b.id)),
        };
        let b_under_a = FolderPatch {
            name: None,
            parent_id: Some(Some(a.id)),
        };
        let (first, second) = tokio::join!(
            store.patch_folder(owner, a.id, a_under_b),
            store.patch_folder(owner, b.id, b_under_a),
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(StoreError::Cycle)));

        let path = store.folder_path(owner, a.id).await.unwrap();
        let names: Vec<_> = path.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[tokio::test]
    async fn test_move_into_descendant_is_cycle() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let a = folder(&store, owner, "a", None).await;
        let b = folder(&store, owner, "b", Some(a.id)).await;

        let into_child = FolderPatch {
            name: None,
            parent_id: Some(Some(b.id)),
        };
        let err = store.patch_folder(owner, a.id, into_child).await.unwrap_err();
        assert!(matches!(err, StoreError::Cycle));

        let into_self = FolderPatch {
            name: None,
            parent_id: Some(Some(a.id)),
        };
        let err = store.patch_folder(owner, a.id, into_self).await.unwrap_err();
        assert!(matches!(err, StoreError::Cycle));
    }

    #[tokio::test]
    async fn test_delete_folder_detaches_children() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let a = folder(&store, owner, "a", None).await;
        let b = folder(&store, owner, "b", Some(a.id)).await;
        let c = folder(&store, owner, "c", Some(b.id)).await;
        let n = note(&store, owner, Some(a.id)).await;

        store.delete_folder(owner, a.id).await.unwrap();

        assert!(matches!(
            store.get_folder(owner, a.id).await,
            Err(StoreError::NotFound(_))
        ));
        let note = store.get_note(owner, n.id).await.unwrap();
        assert_eq!(note.folder_id, None);
        let b = store.get_folder(owner, b.id).await.unwrap();
        assert_eq!((b.parent_id, b.depth), (None, 0));
        assert_eq!(store.get_folder(owner, c.id).await.unwrap().depth, 1);
    }

    #[tokio::test]
    async fn test_rows_are_owner_scoped() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let n = note(&store, alice, None).await;
        let f = folder(&store, alice, "private", None).await;

        assert!(matches!(
            store.get_note(bob, n.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.list_notes(bob, FolderFilter::All).await.unwrap().is_empty());
        let err = store
            .create_note(
                bob,
                NoteCreate {
                    title: None,
                    content: "[]".to_string(),
                    folder_id: Some(f.id),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_note_counts_skip_deleted() {
        let store = MemoryStore::new();
        let owner = user(&store, "alice").await;
        let f = folder(&store, owner, "f", None).await;
        note(&store, owner, Some(f.id)).await;
        let gone = note(&store, owner, Some(f.id)).await;
        note(&store, owner, None).await;
        store.delete_note(owner, gone.id).await.unwrap();

        let counts = store.note_counts(owner).await.unwrap();
        assert_eq!(counts.get(&f.id), Some(&1));
        assert_eq!(counts.len(), 1);
    }
}
