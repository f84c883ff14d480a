//! Editor state owned by the application shell.
//!
//! [`EditorContext`] records whether the note editor is open, for which note, and
//! which folder a new note starts in. It is passed explicitly to whatever needs it.

use std::time::Duration;

use store::Note;
use uuid::Uuid;

use crate::autosave::{Autosave, SaveEvent};
use crate::backend::NotesBackend;

#[derive(Clone, Debug, PartialEq)]
pub enum EditorMode {
    Create { folder_id: Option<Uuid> },
    Edit { note: Note },
}

#[derive(Clone, Debug, Default)]
pub struct EditorContext {
    mode: Option<EditorMode>,
    editing_note_id: Option<Uuid>,
}

impl EditorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_create(&mut self, folder_id: Option<Uuid>) {
        self.mode = Some(EditorMode::Create { folder_id });
        self.editing_note_id = None;
    }

    pub fn open_edit(&mut self, note: Note) {
        self.editing_note_id = Some(note.id);
        self.mode = Some(EditorMode::Edit { note });
    }

    pub fn close(&mut self) {
        self.mode = None;
        self.editing_note_id = None;
    }

    /// Record the id a freshly created note received.
    pub fn set_editing_note_id(&mut self, id: Option<Uuid>) {
        self.editing_note_id = id;
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn mode(&self) -> Option<&EditorMode> {
        self.mode.as_ref()
    }

    pub fn editing_note_id(&self) -> Option<Uuid> {
        self.editing_note_id
    }

    /// Track the id of a note created while the editor is open.
    pub fn apply(&mut self, event: &SaveEvent) {
        if let SaveEvent::Created(note) = event {
            if self.is_open() && self.editing_note_id.is_none() {
                self.set_editing_note_id(Some(note.id));
            }
        }
    }

    /// Start an autosave session for the open editor.
    pub fn autosave<B: NotesBackend + 'static>(&self, backend: B, delay: Duration) -> Option<Autosave<B>> {
        match self.mode.as_ref()? {
            EditorMode::Create { folder_id } => Some(Autosave::new(backend, None, *folder_id, delay)),
            EditorMode::Edit { note } => Some(Autosave::new(backend, Some(note.clone()), note.folder_id, delay)),
        }
    }
}
