//! # User model
//!
//! [`User`] is the complete row of the `users` table, including the Argon2 password
//! hash. It never leaves the server: handlers project it into a
//! [`store::UserInfo`] with [`User::to_info`] before responding.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use store::UserInfo;
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Values needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
