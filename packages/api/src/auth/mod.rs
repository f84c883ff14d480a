//! Authentication: password hashing, bearer tokens and the request extractor.

mod extract;
mod password;
mod token;

pub use extract::AuthUser;
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenKeys, DEFAULT_TOKEN_TTL_DAYS};
