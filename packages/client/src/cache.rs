//! Last fetched note and folder lists, kept in step with local writes.

use store::{Folder, FolderFilter, Note};
use uuid::Uuid;

use crate::autosave::SaveEvent;

#[derive(Clone, Debug, Default)]
pub struct NoteCache {
    notes: Vec<Note>,
    folders: Vec<Folder>,
    notes_stale: bool,
    folders_stale: bool,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Cached notes inside `filter`, in cache order (most recently updated first).
    pub fn notes_in(&self, filter: FolderFilter) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| filter.matches(n.folder_id))
    }

    pub fn note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// The note list should be fetched again before it is shown.
    pub fn notes_stale(&self) -> bool {
        self.notes_stale
    }

    pub fn folders_stale(&self) -> bool {
        self.folders_stale
    }

    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.notes_stale = false;
    }

    pub fn replace_folders(&mut self, folders: Vec<Folder>) {
        self.folders = folders;
        self.folders_stale = false;
    }

    /// Fold an autosave result into the cache.
    pub fn apply(&mut self, event: &SaveEvent) {
        match event {
            SaveEvent::Created(_) => self.notes_stale = true,
            SaveEvent::Updated(note) => match self.notes.iter().position(|n| n.id == note.id) {
                Some(i) => {
                    self.notes.remove(i);
                    self.notes.insert(0, note.clone());
                }
                None => self.notes_stale = true,
            },
            SaveEvent::Failed { .. } => {}
        }
    }

    pub fn note_deleted(&mut self, id: Uuid) {
        self.notes.retain(|n| n.id != id);
    }

    /// Mirror a folder delete: its notes and direct children move to the root.
    pub fn folder_deleted(&mut self, id: Uuid) {
        self.folders.retain(|f| f.id != id);
        for folder in &mut self.folders {
            if folder.parent_id == Some(id) {
                folder.parent_id = None;
                self.folders_stale = true;
            }
        }
        for note in &mut self.notes {
            if note.folder_id == Some(id) {
                note.folder_id = None;
            }
        }
    }
}
