//! # API crate: HTTP backend for the notes app
//!
//! This crate holds everything the server binary needs: the axum router and its
//! handlers, bearer-token authentication, the persistence layer and settings.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2 password hashing, HS256 access tokens, the [`auth::AuthUser`] extractor |
//! | [`db`] | The [`db::NoteStore`] trait with PostgreSQL and in-memory implementations, migrations |
//! | [`error`] | [`ApiError`] and its mapping to status codes and `{"error": ...}` bodies |
//! | [`extract`] | [`extract::Payload`], a JSON body extractor with JSON rejections |
//! | [`models`] | Database rows (`User`, `NoteRow`, `FolderRow`) and their wire projections |
//! | [`routes`] | Request handlers grouped by resource |
//! | [`settings`] | Layered configuration from defaults, `config.toml` and `NOTES__*` variables |
//!
//! ## Routes
//!
//! - **Auth**: `POST /auth/register`, `POST /auth/login`
//! - **Users**: `GET /users/@me`
//! - **Notes**: `GET|POST /notes`, `GET|PATCH|DELETE /notes/{id}`
//! - **Folders**: `GET|POST /folders`, `GET /folders/tree`, `GET|PATCH|DELETE /folders/{id}`
//!
//! Every route except the two auth routes requires `Authorization: Bearer <token>`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod settings;

pub use error::ApiError;
pub use settings::Settings;

use auth::TokenKeys;
use db::NoteStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn NoteStore>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(store: impl NoteStore + 'static, tokens: TokenKeys) -> Self {
        Self {
            store: Arc::new(store),
            tokens,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    use routes::{auth, folders, notes, users};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/@me", get(users::me))
        .route("/notes", get(notes::list).post(notes::create))
        .route(
            "/notes/{id}",
            get(notes::show).patch(notes::update).delete(notes::destroy),
        )
        .route("/folders", get(folders::list).post(folders::create))
        .route("/folders/tree", get(folders::tree))
        .route(
            "/folders/{id}",
            get(folders::show)
                .patch(folders::update)
                .delete(folders::destroy),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
