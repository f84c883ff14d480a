//! # Autosave controller
//!
//! One [`Autosave`] drives one editing session. Title, content and folder edits
//! land in a local draft and (re)arm a single debounce timer, so a burst of edits
//! on any combination of fields produces one write. [`Autosave::flush`] and
//! [`Autosave::close`] cancel the timer and write immediately.
//!
//! A write sends only the fields the user edited since the last confirmed write,
//! and of those only the ones that differ from the confirmed note. Fields the
//! user left alone are never sent, so they cannot overwrite changes made
//! elsewhere. Without a confirmed note the session creates one, but only once
//! the content is non-empty. Every write runs behind one async mutex, so a flush
//! that starts while a create is still in flight waits for it and then sends an
//! update instead of a second create.
//!
//! Results are broadcast as [`SaveEvent`]s. A failed write leaves the confirmed
//! note untouched and keeps the edit in the draft for the next flush.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use store::{Note, NoteCreate, NotePatch};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::backend::NotesBackend;
use crate::config::AutosaveConfig;
use crate::error::ClientError;

const EVENT_CAPACITY: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SavePhase {
    /// Nothing scheduled.
    Idle,
    /// Edits are waiting for the debounce timer.
    Pending,
    /// A write is in progress.
    Flushing,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaveEvent {
    Created(Note),
    Updated(Note),
    Failed { note_id: Option<Uuid>, message: String },
}

/// The editor's current values.
#[derive(Clone, Debug, Default, PartialEq)]
struct Draft {
    title: String,
    content: String,
    folder_id: Option<Uuid>,
}

impl Draft {
    fn title(&self) -> Option<String> {
        store::validation::normalize_title(Some(self.title.clone()))
    }
}

/// Fields edited since the last write took its snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Touched {
    title: bool,
    content: bool,
    folder: bool,
}

impl Touched {
    fn merge(&mut self, other: Touched) {
        self.title |= other.title;
        self.content |= other.content;
        self.folder |= other.folder;
    }
}

#[derive(Debug, PartialEq)]
enum Change {
    Nothing,
    Create(NoteCreate),
    Patch(Uuid, NotePatch),
}

/// What has to be sent to apply the `touched` fields of `draft` on top of `confirmed`.
fn diff(confirmed: Option<&Note>, draft: &Draft, touched: Touched) -> Change {
    let Some(note) = confirmed else {
        if draft.content.is_empty() {
            return Change::Nothing;
        }
        return Change::Create(NoteCreate {
            title: draft.title(),
            content: draft.content.clone(),
            folder_id: draft.folder_id,
        });
    };

    let title = draft.title();
    let patch = NotePatch {
        title: (touched.title && title != note.title).then_some(title),
        content: (touched.content && draft.content != note.content).then(|| draft.content.clone()),
        folder_id: (touched.folder && draft.folder_id != note.folder_id).then_some(draft.folder_id),
    };
    if patch.is_empty() {
        Change::Nothing
    } else {
        Change::Patch(note.id, patch)
    }
}

struct State {
    draft: Draft,
    phase: SavePhase,
    note_id: Option<Uuid>,
    /// Bumped on every edit and flush; a timer only fires if it still holds the latest value.
    generation: u64,
    /// Edits recorded since the last write took its snapshot.
    dirty: bool,
    touched: Touched,
}

struct Shared<B> {
    backend: B,
    delay: Duration,
    state: Mutex<State>,
    confirmed: tokio::sync::Mutex<Option<Note>>,
    events: broadcast::Sender<SaveEvent>,
}

impl<B> Shared<B> {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: NotesBackend> Shared<B> {
    async fn write(&self) -> Result<Option<Note>, ClientError> {
        let mut confirmed = self.confirmed.lock().await;

        let (change, touched) = {
            let mut state = self.state();
            state.dirty = false;
            let touched = std::mem::take(&mut state.touched);
            let change = diff(confirmed.as_ref(), &state.draft, touched);
            if change != Change::Nothing {
                state.phase = SavePhase::Flushing;
            }
            (change, touched)
        };

        let (result, created) = match change {
            Change::Nothing => {
                self.settle();
                return Ok(None);
            }
            Change::Create(create) => {
                tracing::debug!("creating note");
                (self.backend.create_note(create).await, true)
            }
            Change::Patch(id, patch) => {
                tracing::debug!(note_id = %id, "updating note");
                (self.backend.patch_note(id, patch).await, false)
            }
        };

        let outcome = match result {
            Ok(note) => {
                self.state().note_id = Some(note.id);
                *confirmed = Some(note.clone());
                let event = if created {
                    SaveEvent::Created(note.clone())
                } else {
                    SaveEvent::Updated(note.clone())
                };
                let _ = self.events.send(event);
                Ok(Some(note))
            }
            Err(err) => {
                self.state().touched.merge(touched);
                let note_id = confirmed.as_ref().map(|n| n.id);
                tracing::warn!(?note_id, error = %err, "autosave failed");
                let _ = self.events.send(SaveEvent::Failed {
                    note_id,
                    message: err.to_string(),
                });
                Err(err)
            }
        };
        self.settle();
        outcome
    }

    fn settle(&self) {
        let mut state = self.state();
        state.phase = if state.dirty {
            SavePhase::Pending
        } else {
            SavePhase::Idle
        };
    }
}

/// Debounced, single-writer autosave for one note.
pub struct Autosave<B> {
    shared: Arc<Shared<B>>,
}

impl<B: NotesBackend + 'static> Autosave<B> {
    /// Start a session for `note`, or for a new note placed in `folder_id`.
    pub fn new(backend: B, note: Option<Note>, folder_id: Option<Uuid>, delay: Duration) -> Self {
        let draft = match &note {
            Some(note) => Draft {
                title: note.title.clone().unwrap_or_default(),
                content: note.content.clone(),
                folder_id: note.folder_id,
            },
            None => Draft {
                folder_id,
                ..Draft::default()
            },
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                backend,
                delay,
                state: Mutex::new(State {
                    draft,
                    phase: SavePhase::Idle,
                    note_id: note.as_ref().map(|n| n.id),
                    generation: 0,
                    dirty: false,
                    touched: Touched::default(),
                }),
                confirmed: tokio::sync::Mutex::new(note),
                events,
            }),
        }
    }

    pub fn from_config(backend: B, note: Option<Note>, folder_id: Option<Uuid>, config: &AutosaveConfig) -> Self {
        Self::new(backend, note, folder_id, config.delay())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.shared.events.subscribe()
    }

    pub fn phase(&self) -> SavePhase {
        self.shared.state().phase
    }

    /// Id of the note being edited, once the server knows it.
    pub fn note_id(&self) -> Option<Uuid> {
        self.shared.state().note_id
    }

    pub fn edit_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.record(|state| {
            state.draft.title = title;
            state.touched.title = true;
        });
    }

    pub fn edit_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.record(|state| {
            state.draft.content = content;
            state.touched.content = true;
        });
    }

    pub fn select_folder(&self, folder_id: Option<Uuid>) {
        self.record(|state| {
            state.draft.folder_id = folder_id;
            state.touched.folder = true;
        });
    }

    fn record(&self, edit: impl FnOnce(&mut State)) {
        let generation = {
            let mut state = self.shared.state();
            edit(&mut state);
            state.dirty = true;
            if state.phase == SavePhase::Idle {
                state.phase = SavePhase::Pending;
            }
            state.generation += 1;
            state.generation
        };

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(shared.delay).await;
            let current = shared.state().generation;
            if current != generation {
                return;
            }
            // Errors are broadcast as SaveEvent::Failed.
            let _ = shared.write().await;
        });
    }

    /// Cancel the timer and write now.
    pub async fn flush(&self) -> Result<Option<Note>, ClientError> {
        self.shared.state().generation += 1;
        self.shared.write().await
    }

    /// Final flush when the editor goes away.
    pub async fn close(self) -> Result<Option<Note>, ClientError> {
        self.flush().await
    }
}
