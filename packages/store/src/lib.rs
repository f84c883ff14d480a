pub mod breadcrumbs;
pub mod models;
pub mod tree;
pub mod validation;

pub use breadcrumbs::{path_from_index, resolve_path, resolve_trail, trail_from_index, FolderLookup};
pub use models::{
    AuthTokens, Folder, FolderCreate, FolderFilter, FolderPatch, FolderPathEntry, LoginCredentials,
    Note, NoteCreate, NotePatch, Registration, UserInfo,
};
pub use tree::{build_tree, flatten_visible, forest_size, FolderTreeNode, TreeError, VisibleFolder};
pub use validation::ValidationError;
