use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status. `message` is the `error`
    /// field of the JSON body when there is one.
    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("not logged in")]
    Unauthenticated,
    #[error("invalid client config: {0}")]
    Config(#[from] toml::de::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
