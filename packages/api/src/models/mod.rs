//! Server-side data models.

mod rows;
mod user;

pub use rows::{FolderRow, NoteRow};
pub use user::{NewUser, User};
