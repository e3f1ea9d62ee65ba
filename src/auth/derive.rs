//! Deterministic key derivation for mnemonic-based accounts.
//!
//! Clients derive their Ed25519 keypair from a mnemonic phrase; this module
//! mirrors that construction server-side so the backend can tell a client
//! which account a phrase belongs to without ever seeing a private key used
//! for signing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::SigningKey;

/// PBKDF2 rounds, matching the client-side derivation.
const PBKDF2_ITERATIONS: u32 = 2048;
const PBKDF2_SALT: &[u8] = b"mnemonic";

/// Derive the URL-safe base64 public key for a mnemonic phrase.
///
/// PBKDF2-HMAC-SHA256 over the phrase with salt `"mnemonic"` and 2048
/// rounds yields the 32-byte Ed25519 seed; the public half of the seeded
/// keypair is returned without padding.
pub fn public_key_for_mnemonic(mnemonic: &str) -> String {
    let mut seed = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<sha2::Sha256>(
        mnemonic.as_bytes(),
        PBKDF2_SALT,
        PBKDF2_ITERATIONS,
        &mut seed,
    );

    let signing_key = SigningKey::from_bytes(&seed);
    URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes())
}
