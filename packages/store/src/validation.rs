//! Input validation shared by the server and the client.
//!
//! The server rejects invalid payloads with `400 Bad Request`; the client can run
//! the same checks before sending anything.

use thiserror::Error;

use crate::models::{FolderCreate, FolderPatch, LoginCredentials, NoteCreate, NotePatch, Registration};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 32;
pub const EMAIL_MAX: usize = 64;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 64;
pub const TITLE_MAX: usize = 256;
pub const FOLDER_NAME_MAX: usize = 64;

/// A payload field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if len == 0 {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if len < USERNAME_MIN {
        return Err(ValidationError::new(
            "username",
            format!("Username must be at least {USERNAME_MIN} characters long"),
        ));
    }
    if len > USERNAME_MAX {
        return Err(ValidationError::new(
            "username",
            format!("Username must be at most {USERNAME_MAX} characters long"),
        ));
    }
    let mut chars = username.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::new(
            "username",
            "Username must start with a letter and contain only letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if email.chars().count() > EMAIL_MAX {
        return Err(ValidationError::new(
            "email",
            format!("Email must be at most {EMAIL_MAX} characters long"),
        ));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::new("email", "Invalid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len == 0 {
        return Err(ValidationError::new("password", "Password is required"));
    }
    if len < PASSWORD_MIN {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {PASSWORD_MIN} characters long"),
        ));
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at most {PASSWORD_MAX} characters long"),
        ));
    }
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ));
    }
    Ok(())
}

pub fn validate_registration(registration: &Registration) -> Result<(), ValidationError> {
    validate_username(&registration.username)?;
    validate_email(&registration.email)?;
    validate_password(&registration.password)
}

pub fn validate_login(credentials: &LoginCredentials) -> Result<(), ValidationError> {
    if credentials.username.is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if credentials.password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(())
}

fn validate_title(title: Option<&str>) -> Result<(), ValidationError> {
    if title.is_some_and(|t| t.chars().count() > TITLE_MAX) {
        return Err(ValidationError::new(
            "title",
            format!("Title must be at most {TITLE_MAX} characters long"),
        ));
    }
    Ok(())
}

pub fn validate_note_create(create: &NoteCreate) -> Result<(), ValidationError> {
    validate_title(create.title.as_deref())?;
    if create.content.is_empty() {
        return Err(ValidationError::new("content", "Content is required"));
    }
    Ok(())
}

pub fn validate_note_patch(patch: &NotePatch) -> Result<(), ValidationError> {
    validate_title(patch.title.as_ref().and_then(|t| t.as_deref()))
}

/// Trim a folder name and check its length.
pub fn normalize_folder_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Folder name is required"));
    }
    if name.chars().count() > FOLDER_NAME_MAX {
        return Err(ValidationError::new(
            "name",
            format!("Folder name must be at most {FOLDER_NAME_MAX} characters long"),
        ));
    }
    Ok(name.to_string())
}

pub fn validate_folder_create(create: &FolderCreate) -> Result<(), ValidationError> {
    normalize_folder_name(&create.name).map(|_| ())
}

pub fn validate_folder_patch(patch: &FolderPatch) -> Result<(), ValidationError> {
    match &patch.name {
        Some(name) => normalize_folder_name(name).map(|_| ()),
        None => Ok(()),
    }
}

/// Empty titles are stored as "no title".
pub fn normalize_title(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("1alice").is_err());
        assert!(validate_username("alice-b").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Secret1").is_ok());
        assert!(validate_password("Sec1").is_err());
        assert!(validate_password("secret1").is_err());
        assert!(validate_password("SECRET1").is_err());
        assert!(validate_password("Secrets").is_err());
    }

    #[test]
    fn test_note_create_requires_content() {
        let create = NoteCreate {
            title: Some("t".to_string()),
            content: String::new(),
            folder_id: None,
        };
        let err = validate_note_create(&create).unwrap_err();
        assert_eq!(err.field, "content");
    }

    #[test]
    fn test_title_length() {
        let patch = NotePatch {
            title: Some(Some("x".repeat(TITLE_MAX + 1))),
            ..Default::default()
        };
        assert!(validate_note_patch(&patch).is_err());
        let patch = NotePatch {
            title: Some(None),
            ..Default::default()
        };
        assert!(validate_note_patch(&patch).is_ok());
    }

    #[test]
    fn test_folder_name_is_trimmed() {
        assert_eq!(normalize_folder_name("  Work ").unwrap(), "Work");
        assert!(normalize_folder_name("   ").is_err());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(Some(String::new())), None);
        assert_eq!(normalize_title(Some("a".into())), Some("a".into()));
    }
}
