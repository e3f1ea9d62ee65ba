//! Typed failures for the authentication core.
//!
//! Errors carry a structural kind rather than a distinguishing message:
//! callers match on the variant, and the gateway collapses everything a
//! client should not be able to probe into one terse unauthorized response.

use thiserror::Error;

use crate::db::StoreError;

/// Reasons a challenge verification can fail.
///
/// The distinction exists for logs and tests only; all four kinds surface
/// to clients as the same response so an attacker cannot tell an unknown
/// code from an expired or mis-scoped one.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("challenge code not found")]
    NotFound,
    #[error("challenge flow or auth type mismatch")]
    FlowMismatch,
    #[error("challenge code expired")]
    Expired,
    #[error("signature verification failed")]
    InvalidSignature,
}

/// Failures of the auth core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing/malformed bearer credential, bad token, or a session that is
    /// unknown or expired. Deliberately carries no detail.
    #[error("unauthorized")]
    Unauthorized,

    /// Session creation requires a user agent as a device fingerprint.
    #[error("no user agent provided")]
    MissingUserAgent,

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    /// Token minting failed; a server-side fault, never a client one.
    #[error("failed to encode session token")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_error_converts() {
        let err: AuthError = ChallengeError::Expired.into();
        assert!(matches!(err, AuthError::Challenge(ChallengeError::Expired)));
    }
}
