//! Compact signed session tokens.
//!
//! A token binds a bearer credential to a session id and nothing else: the
//! payload is `{sid}`, signed HS256 with the server-wide secret. There is no
//! expiry claim on purpose; the referenced session record is the single
//! source of truth for validity, which is why every use goes back through
//! the session store.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::db::Session;

/// The only claim a session token carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sid: String,
}

/// Encodes and verifies session tokens with a symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Build a codec from the server secret.
    ///
    /// Config loading refuses to start the server with an empty secret, so
    /// construction itself is infallible.
    pub fn new(secret: &str) -> Self {
        // Pin HS256: a token presenting any other algorithm is rejected even
        // if otherwise well formed.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Produce the bearer token for a session.
    pub fn encode(&self, session: &Session) -> Result<String, AuthError> {
        let claims = SessionClaims {
            sid: session.id.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::TokenEncoding)
    }

    /// Verify a token and extract its claims.
    ///
    /// Returns `None` on any failure: bad signature, malformed structure,
    /// or algorithm mismatch. Callers never learn which.
    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}
