//! Bearer tokens: HS256 JWTs carrying the user id as `sub`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lifetime of an access token.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signing and verification keys shared by the login handler and the auth extractor.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue an access token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// Returns `None` for bad signatures, expired tokens and malformed subjects.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).ok()?;
        Uuid::parse_str(&data.claims.sub).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let keys = TokenKeys::new("secret", DEFAULT_TOKEN_TTL_DAYS);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token), Some(user_id));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = TokenKeys::new("one", 7).issue(Uuid::new_v4()).unwrap();
        assert_eq!(TokenKeys::new("two", 7).verify(&token), None);
    }

    #[test]
    fn test_rejects_expired_token() {
        let keys = TokenKeys::new("secret", -1);
        let token = keys.issue(Uuid::new_v4()).unwrap();
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn test_rejects_garbage() {
        let keys = TokenKeys::new("secret", 7);
        assert_eq!(keys.verify("not.a.jwt"), None);
    }

    #[test]
    fn test_token_expires_after_seven_days() {
        let keys = TokenKeys::new("secret", DEFAULT_TOKEN_TTL_DAYS);
        let token = keys.issue(Uuid::new_v4()).unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 7 * 24 * 60 * 60);
    }
}
