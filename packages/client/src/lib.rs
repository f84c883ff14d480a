//! # Client crate: talking to the notes API
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`http`] | [`ApiClient`], a typed wrapper around every API route |
//! | [`autosave`] | Debounced single-writer autosave of the note being edited |
//! | [`cache`] | The last fetched note and folder lists, updated from local writes |
//! | [`editor`] | Which note the editor has open |
//! | [`preview`] | Stale-safe rendering of note previews and plain-text extraction |
//! | [`config`] | `notes-client.toml` |
//!
//! Folder trees and breadcrumbs come from the `store` crate; [`ApiClient`]
//! implements [`store::FolderLookup`] so it can drive [`store::resolve_path`].

pub mod autosave;
pub mod backend;
pub mod cache;
pub mod config;
pub mod editor;
pub mod error;
pub mod http;
pub mod preview;

pub use autosave::{Autosave, SaveEvent, SavePhase};
pub use backend::NotesBackend;
pub use cache::NoteCache;
pub use config::ClientConfig;
pub use editor::{EditorContext, EditorMode};
pub use error::ClientError;
pub use http::{ApiClient, FolderOptions};
pub use preview::{plain_text, render_preview, Preview, PreviewGuard};
