//! Challenge-response authentication and bearer-session lifecycle.
//!
//! The core is passwordless: a client proves control of an Ed25519 keypair
//! by signing a server-issued challenge code, and receives a signed session
//! token in return. Every authenticated request then presents that token,
//! which resolves back to a session record whose expiry slides forward on
//! use.
//!
//! - [`signature`] - Ed25519 verification over URL-safe base64 inputs
//! - [`challenge`] - single-use challenge codes scoped to a flow
//! - [`session`] - session records with 21-day sliding expiry
//! - [`token`] - HS256 session tokens carrying only a session id
//! - [`derive`] - mnemonic to public key derivation
//! - [`Authenticator`] - the request-facing facade for protected routes

pub mod challenge;
pub mod derive;
pub mod error;
pub mod session;
pub mod signature;
pub mod token;

pub use challenge::{ChallengeService, Flow, MNEMONIC_AUTH_TYPE};
pub use error::{AuthError, ChallengeError};
pub use session::{SESSION_TTL_DAYS, SessionService};
pub use token::{SessionClaims, TokenCodec};

use crate::db::Session;

/// Request-facing entry point for protected routes.
///
/// Route handlers obtain their authenticated identity through
/// [`Authenticator::current_session`] and nothing else, so the token check
/// and the session bump cannot drift apart between routes.
#[derive(Clone)]
pub struct Authenticator {
    sessions: SessionService,
    codec: TokenCodec,
}

impl Authenticator {
    pub fn new(sessions: SessionService, codec: TokenCodec) -> Self {
        Self { sessions, codec }
    }

    /// Resolve the session a request acts as, sliding its expiry.
    ///
    /// Takes the Authorization header value explicitly. Every failure
    /// collapses to [`AuthError::Unauthorized`]: a missing header, a
    /// non-bearer scheme, an invalid token, and an unknown or expired
    /// session are deliberately indistinguishable to the caller.
    pub async fn current_session(
        &self,
        authorization: Option<&str>,
    ) -> Result<Session, AuthError> {
        let header = authorization.ok_or(AuthError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Unauthorized)?;

        let claims = self.codec.decode(token).ok_or(AuthError::Unauthorized)?;

        self.sessions
            .get_session_and_bump(&claims.sid)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}
