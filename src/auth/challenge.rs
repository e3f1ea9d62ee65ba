//! Single-use challenge codes for the two-step authentication flows.
//!
//! A challenge code is an opaque nonce the client must sign with its
//! private key to prove possession. Codes are scoped to a (flow, auth type)
//! pair so a login challenge can never satisfy a registration, live for ten
//! minutes, and are consumed by exactly one successful verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::error::{AuthError, ChallengeError};
use super::signature;
use crate::db::{ChallengeCode, ChallengeRepo, Store};

/// How long an issued challenge stays valid.
const CHALLENGE_TTL_MINUTES: i64 = 10;

/// The only auth type currently issued by the flows. The column is free-form
/// so new schemes can ship without a storage change.
pub const MNEMONIC_AUTH_TYPE: &str = "mnemonic";

/// The authentication use-case a challenge is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Registration,
    Login,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Registration => "registration",
            Flow::Login => "login",
        }
    }
}

/// Issues and verifies single-use challenge codes.
#[derive(Clone)]
pub struct ChallengeService {
    store: Arc<dyn Store>,
}

impl ChallengeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Issue a fresh challenge code for `(flow, auth_type)`.
    ///
    /// The client must sign the exact code string and present it to the
    /// matching complete endpoint within the TTL.
    pub async fn create_challenge_code(
        &self,
        flow: Flow,
        auth_type: &str,
    ) -> Result<ChallengeCode, AuthError> {
        let now = Utc::now();
        let challenge = ChallengeCode {
            code: Uuid::new_v4().to_string(),
            flow: flow.as_str().to_string(),
            auth_type: auth_type.to_string(),
            created_at: now,
            expires_at: now + Duration::minutes(CHALLENGE_TTL_MINUTES),
        };
        self.store.insert_challenge(&challenge).await?;
        Ok(challenge)
    }

    /// Verify a signed challenge and consume it.
    ///
    /// Checks run in a fixed order: lookup, flow/auth-type scope, expiry,
    /// and only then the signature, so state cannot be probed through
    /// signature-verification timing. The code is deleted on the success
    /// path only; a failed attempt leaves it usable within its TTL.
    pub async fn verify_challenge_code(
        &self,
        code: &str,
        public_key: &str,
        signature_b64: &str,
        flow: Flow,
        auth_type: &str,
    ) -> Result<(), AuthError> {
        let challenge = self
            .store
            .challenge_by_code(code)
            .await?
            .ok_or(ChallengeError::NotFound)?;

        if challenge.flow != flow.as_str() || challenge.auth_type != auth_type {
            return Err(ChallengeError::FlowMismatch.into());
        }

        if challenge.expires_at < Utc::now() {
            return Err(ChallengeError::Expired.into());
        }

        if !signature::verify(code.as_bytes(), public_key, signature_b64) {
            return Err(ChallengeError::InvalidSignature.into());
        }

        // Conditional delete: of two verifications racing on the same code,
        // exactly one observes the removal and wins.
        if !self.store.consume_challenge(code).await? {
            return Err(ChallengeError::NotFound.into());
        }

        Ok(())
    }
}
