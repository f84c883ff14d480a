//! # Password hashing and verification: Argon2id
//!
//! - [`hash_password`] generates a random salt via [`OsRng`], hashes the plaintext
//!   with the default Argon2id parameters and returns a PHC-format string
//!   (`$argon2id$v=19$m=19456,t=2,p=1$...`) for the `users.password_hash` column.
//! - [`verify_password`] parses a stored PHC string and checks a plaintext
//!   against it: `Ok(true)` on match, `Ok(false)` on mismatch, `Err` if the
//!   stored hash is malformed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub use argon2::password_hash::Error as PasswordError;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret1", &hash).unwrap());
        assert!(!verify_password("secret1", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("Secret1", "not-a-hash").is_err());
    }
}
