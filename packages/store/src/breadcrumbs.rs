//! # Breadcrumbs: ancestor chain of a folder
//!
//! Two ways of resolving the path from the root to a folder:
//!
//! - [`resolve_path`] walks parent pointers through a [`FolderLookup`], one lookup
//!   per level. The walk stops at the first missing parent or failed lookup and
//!   returns whatever it collected so far.
//! - [`path_from_index`] performs the same walk over a folder list that was
//!   already fetched.
//!
//! Both return ancestors ordered from the root to the immediate parent. The
//! `*_trail` variants also append the folder itself. An absent folder id yields
//! an empty path, and a visited set stops the walk if parent pointers loop.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use uuid::Uuid;

use crate::models::{Folder, FolderPathEntry};

/// Async single-folder lookup used by [`resolve_path`].
pub trait FolderLookup {
    type Error: std::fmt::Display;

    fn folder(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Folder>, Self::Error>> + Send;
}

/// Ancestors of `folder_id`, root first, excluding the folder itself.
pub async fn resolve_path<L>(lookup: &L, folder_id: Option<Uuid>) -> Vec<FolderPathEntry>
where
    L: FolderLookup + Sync,
{
    walk_lookup(lookup, folder_id, false).await
}

/// Like [`resolve_path`], but ending with the folder itself.
pub async fn resolve_trail<L>(lookup: &L, folder_id: Option<Uuid>) -> Vec<FolderPathEntry>
where
    L: FolderLookup + Sync,
{
    walk_lookup(lookup, folder_id, true).await
}

async fn walk_lookup<L>(lookup: &L, folder_id: Option<Uuid>, include_self: bool) -> Vec<FolderPathEntry>
where
    L: FolderLookup + Sync,
{
    let Some(folder_id) = folder_id else {
        return Vec::new();
    };
    let Ok(Some(start)) = lookup.folder(folder_id).await else {
        return Vec::new();
    };

    let mut path = Vec::new();
    let mut visited = HashSet::from([start.id]);
    if include_self {
        path.push(start.path_entry());
    }

    let mut next = start.parent_id;
    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            break;
        }
        match lookup.folder(parent_id).await {
            Ok(Some(parent)) => {
                next = parent.parent_id;
                path.push(parent.path_entry());
            }
            _ => break,
        }
    }

    path.reverse();
    path
}

/// Ancestors of `folder_id` within an already fetched folder list.
pub fn path_from_index(folders: &[Folder], folder_id: Option<Uuid>) -> Vec<FolderPathEntry> {
    walk_index(folders, folder_id, false)
}

/// Like [`path_from_index`], but ending with the folder itself.
pub fn trail_from_index(folders: &[Folder], folder_id: Option<Uuid>) -> Vec<FolderPathEntry> {
    walk_index(folders, folder_id, true)
}

fn walk_index(folders: &[Folder], folder_id: Option<Uuid>, include_self: bool) -> Vec<FolderPathEntry> {
    let index: HashMap<Uuid, &Folder> = folders.iter().map(|f| (f.id, f)).collect();
    let Some(start) = folder_id.and_then(|id| index.get(&id).copied()) else {
        return Vec::new();
    };

    let mut path = Vec::new();
    let mut visited = HashSet::from([start.id]);
    if include_self {
        path.push(start.path_entry());
    }

    let mut next = start.parent_id;
    while let Some(parent) = next.and_then(|id| index.get(&id).copied()) {
        if !visited.insert(parent.id) {
            break;
        }
        path.push(parent.path_entry());
        next = parent.parent_id;
    }

    path.reverse();
    path
}
