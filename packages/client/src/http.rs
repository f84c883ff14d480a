//! # HTTP client for the notes API
//!
//! [`ApiClient`] wraps a `reqwest::Client` and a base URL and keeps the bearer
//! token obtained by [`ApiClient::login`]. Every call other than `register` and
//! `login` fails with [`ClientError::Unauthenticated`] before touching the network
//! when no token is set.
//!
//! Non-success responses become [`ClientError::Status`], carrying the `error`
//! message from the JSON body.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use store::{
    AuthTokens, Folder, FolderCreate, FolderFilter, FolderLookup, FolderPatch, FolderTreeNode,
    LoginCredentials, Note, NoteCreate, NotePatch, Registration, UserInfo,
};
use uuid::Uuid;

use crate::backend::NotesBackend;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Extra data to request with a single folder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FolderOptions {
    pub note_count: bool,
    pub path: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.server.base_url.clone())
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token().ok_or(ClientError::Unauthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        tracing::debug!(%status, %message, "request rejected");
        Err(ClientError::Status { status, message })
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn empty(request: RequestBuilder) -> Result<(), ClientError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserInfo, ClientError> {
        Self::json(self.request(Method::POST, "/auth/register").json(registration)).await
    }

    /// Log in and keep the returned access token for later calls.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthTokens, ClientError> {
        let tokens: AuthTokens =
            Self::json(self.request(Method::POST, "/auth/login").json(credentials)).await?;
        self.set_token(Some(tokens.access_token.clone()));
        tracing::info!(username = %credentials.username, "logged in");
        Ok(tokens)
    }

    pub fn logout(&self) {
        self.set_token(None);
    }

    pub async fn me(&self) -> Result<UserInfo, ClientError> {
        Self::json(self.authorized(Method::GET, "/users/@me")?).await
    }

    pub async fn list_notes(&self, filter: FolderFilter) -> Result<Vec<Note>, ClientError> {
        let mut request = self.authorized(Method::GET, "/notes")?;
        if let Some(folder_id) = filter.to_query() {
            request = request.query(&[("folderId", folder_id)]);
        }
        Self::json(request).await
    }

    pub async fn get_note(&self, id: Uuid) -> Result<Note, ClientError> {
        Self::json(self.authorized(Method::GET, &format!("/notes/{id}"))?).await
    }

    pub async fn create_note(&self, create: &NoteCreate) -> Result<Note, ClientError> {
        Self::json(self.authorized(Method::POST, "/notes")?.json(create)).await
    }

    pub async fn patch_note(&self, id: Uuid, patch: &NotePatch) -> Result<Note, ClientError> {
        Self::json(self.authorized(Method::PATCH, &format!("/notes/{id}"))?.json(patch)).await
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<(), ClientError> {
        Self::empty(self.authorized(Method::DELETE, &format!("/notes/{id}"))?).await
    }

    pub async fn list_folders(&self, parent: FolderFilter, note_count: bool) -> Result<Vec<Folder>, ClientError> {
        let mut request = self.authorized(Method::GET, "/folders")?;
        if let Some(parent_id) = parent.to_query() {
            request = request.query(&[("parentId", parent_id)]);
        }
        if note_count {
            request = request.query(&[("noteCount", "true")]);
        }
        Self::json(request).await
    }

    pub async fn folder_tree(&self) -> Result<Vec<FolderTreeNode>, ClientError> {
        Self::json(self.authorized(Method::GET, "/folders/tree")?).await
    }

    pub async fn get_folder(&self, id: Uuid, options: FolderOptions) -> Result<Folder, ClientError> {
        let mut request = self.authorized(Method::GET, &format!("/folders/{id}"))?;
        if options.note_count {
            request = request.query(&[("noteCount", "true")]);
        }
        if options.path {
            request = request.query(&[("path", "true")]);
        }
        Self::json(request).await
    }

    pub async fn create_folder(&self, create: &FolderCreate) -> Result<Folder, ClientError> {
        Self::json(self.authorized(Method::POST, "/folders")?.json(create)).await
    }

    pub async fn patch_folder(&self, id: Uuid, patch: &FolderPatch) -> Result<Folder, ClientError> {
        Self::json(self.authorized(Method::PATCH, &format!("/folders/{id}"))?.json(patch)).await
    }

    pub async fn delete_folder(&self, id: Uuid) -> Result<(), ClientError> {
        Self::empty(self.authorized(Method::DELETE, &format!("/folders/{id}"))?).await
    }
}

#[async_trait]
impl NotesBackend for ApiClient {
    async fn create_note(&self, create: NoteCreate) -> Result<Note, ClientError> {
        ApiClient::create_note(self, &create).await
    }

    async fn patch_note(&self, id: Uuid, patch: NotePatch) -> Result<Note, ClientError> {
        ApiClient::patch_note(self, id, &patch).await
    }
}

impl FolderLookup for ApiClient {
    type Error = ClientError;

    async fn folder(&self, id: Uuid) -> Result<Option<Folder>, ClientError> {
        match self.get_folder(id, FolderOptions::default()).await {
            Ok(folder) => Ok(Some(folder)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
