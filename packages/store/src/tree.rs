//! # Folder tree: flat folder list to a sorted forest
//!
//! [`build_tree`] turns the flat, owner-scoped folder list returned by the API into
//! a forest of [`FolderTreeNode`]s. Construction is arena-style: folders are
//! indexed by id, child lists are vectors of arena indices, and the forest is only
//! materialised once every folder is known to be reachable from a root.
//!
//! A folder whose `parent_id` is missing from the set is treated as a root. A
//! folder that cannot be reached from any root sits on a parent cycle and makes
//! the whole build fail with [`TreeError::Cycle`].

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Folder;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("folder {folder_id} is part of a parent cycle")]
    Cycle { folder_id: Uuid },
}

/// A folder with its resolved children and note count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderTreeNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub note_count: i64,
    pub children: Vec<FolderTreeNode>,
}

impl FolderTreeNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(FolderTreeNode::count).sum::<usize>()
    }

    /// Depth-first search for a folder by id.
    pub fn find(&self, id: Uuid) -> Option<&FolderTreeNode> {
        if self.folder.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Total number of nodes in a forest.
pub fn forest_size(forest: &[FolderTreeNode]) -> usize {
    forest.iter().map(FolderTreeNode::count).sum()
}

/// Sibling order: case-insensitive name, then exact name.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn name_of(slots: &[Option<Folder>], i: usize) -> &str {
    slots[i].as_ref().map(|f| f.name.as_str()).unwrap_or("")
}

fn sort_by_name(slots: &[Option<Folder>], list: &mut [usize]) {
    list.sort_by(|&a, &b| compare_names(name_of(slots, a), name_of(slots, b)));
}

/// Build a forest from a flat folder list.
///
/// `note_counts` maps folder ids to their number of notes; folders missing from
/// the map get a count of 0.
pub fn build_tree(
    folders: Vec<Folder>,
    note_counts: &HashMap<Uuid, i64>,
) -> Result<Vec<FolderTreeNode>, TreeError> {
    let index: HashMap<Uuid, usize> = folders
        .iter()
        .enumerate()
        .map(|(i, folder)| (folder.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); folders.len()];
    let mut roots = Vec::new();
    for (i, folder) in folders.iter().enumerate() {
        match folder.parent_id.and_then(|parent| index.get(&parent)) {
            Some(&parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    // Every folder must be reachable from a root, otherwise it sits on a cycle.
    let mut reached = vec![false; folders.len()];
    let mut stack = roots.clone();
    while let Some(i) = stack.pop() {
        if reached[i] {
            continue;
        }
        reached[i] = true;
        stack.extend(children[i].iter().copied());
    }
    if let Some(i) = reached.iter().position(|r| !r) {
        return Err(TreeError::Cycle {
            folder_id: folders[i].id,
        });
    }

    let mut slots: Vec<Option<Folder>> = folders.into_iter().map(Some).collect();
    for list in children.iter_mut() {
        sort_by_name(&slots, list);
    }
    sort_by_name(&slots, &mut roots);

    fn materialise(
        i: usize,
        slots: &mut [Option<Folder>],
        children: &[Vec<usize>],
        note_counts: &HashMap<Uuid, i64>,
    ) -> Option<FolderTreeNode> {
        let mut folder = slots[i].take()?;
        folder.note_count = None;
        let note_count = note_counts.get(&folder.id).copied().unwrap_or(0);
        let kids = children[i]
            .iter()
            .filter_map(|&child| materialise(child, slots, children, note_counts))
            .collect();
        Some(FolderTreeNode {
            folder,
            note_count,
            children: kids,
        })
    }

    Ok(roots
        .iter()
        .filter_map(|&root| materialise(root, &mut slots, &children, note_counts))
        .collect())
}

/// A row of a folder browser: one visible folder and its indentation level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleFolder {
    pub id: Uuid,
    pub name: String,
    pub level: usize,
    pub note_count: i64,
    pub has_children: bool,
    pub expanded: bool,
}

/// Flatten a forest into browser rows, descending only into expanded folders.
pub fn flatten_visible(forest: &[FolderTreeNode], expanded: &HashSet<Uuid>) -> Vec<VisibleFolder> {
    fn walk(
        nodes: &[FolderTreeNode],
        level: usize,
        expanded: &HashSet<Uuid>,
        rows: &mut Vec<VisibleFolder>,
    ) {
        for node in nodes {
            let is_expanded = expanded.contains(&node.folder.id);
            rows.push(VisibleFolder {
                id: node.folder.id,
                name: node.folder.name.clone(),
                level,
                note_count: node.note_count,
                has_children: !node.children.is_empty(),
                expanded: is_expanded,
            });
            if is_expanded {
                walk(&node.children, level + 1, expanded, rows);
            }
        }
    }

    let mut rows = Vec::new();
    walk(forest, 0, expanded, &mut rows);
    rows
}
