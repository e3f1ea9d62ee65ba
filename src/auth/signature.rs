//! Ed25519 signature verification for challenge-response authentication.
//!
//! The server stores only public keys; private keys never leave the client.
//! Clients transmit keys and signatures as URL-safe base64 with padding
//! stripped, while the signing scheme itself works on raw bytes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Decode a URL-safe base64 string whose padding may have been stripped.
///
/// Translates `-`/`_` back to the standard alphabet and re-pads to a
/// multiple of 4 before decoding.
fn decode_base64_url(input: &str) -> Option<Vec<u8>> {
    let mut normalized = input.replace('-', "+").replace('_', "/");
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    STANDARD.decode(normalized).ok()
}

/// Verify an Ed25519 signature over `message`.
///
/// # Arguments
/// * `message` - The bytes that were signed
/// * `public_key` - URL-safe base64 encoded 32-byte Ed25519 public key
/// * `signature` - URL-safe base64 encoded 64-byte Ed25519 signature
///
/// # Returns
/// `true` if the signature is valid. Any decoding or cryptographic failure
/// returns `false`, so malformed input is indistinguishable from a bad
/// signature.
pub fn verify(message: &[u8], public_key: &str, signature: &str) -> bool {
    let Some(pk_bytes) = decode_base64_url(public_key) else {
        return false;
    };
    let Some(sig_bytes) = decode_base64_url(signature) else {
        return false;
    };

    // Public key must be exactly 32 bytes
    let pk_bytes: [u8; 32] = match pk_bytes.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };

    // Signature must be exactly 64 bytes
    let sig_bytes: [u8; 64] = match sig_bytes.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };

    let verifying_key = match VerifyingKey::from_bytes(&pk_bytes) {
        Ok(k) => k,
        Err(_) => return false,
    };

    let sig = Signature::from_bytes(&sig_bytes);

    verifying_key.verify(message, &sig).is_ok()
}

/// Generate a new Ed25519 keypair for testing.
///
/// Returns (signing key, URL-safe base64 public key).
#[cfg(test)]
pub fn generate_keypair() -> (ed25519_dalek::SigningKey, String) {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;

    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().as_bytes());

    (signing_key, public_key)
}

/// Sign a message, returning the URL-safe base64 signature (for testing).
#[cfg(test)]
pub fn sign_message(signing_key: &ed25519_dalek::SigningKey, message: &[u8]) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use ed25519_dalek::Signer;

    URL_SAFE_NO_PAD.encode(signing_key.sign(message).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn test_verify_valid_signature() {
        let (signing_key, public_key) = generate_keypair();
        let message = b"challenge-code-to-sign";
        let signature = sign_message(&signing_key, message);

        assert!(verify(message, &public_key, &signature));
    }

    #[test]
    fn test_verify_accepts_padded_standard_base64() {
        // Some clients send padded standard base64; normalization must
        // accept it too.
        let (signing_key, _) = generate_keypair();
        let message = b"padded";
        let signature = sign_message(&signing_key, message);

        let padded_pk = STANDARD.encode(signing_key.verifying_key().as_bytes());
        assert!(verify(message, &padded_pk, &signature));
    }

    #[test]
    fn test_verify_invalid_signature() {
        let (_, public_key) = generate_keypair();
        let bad_signature = URL_SAFE_NO_PAD.encode([0u8; 64]);

        assert!(!verify(b"message", &public_key, &bad_signature));
    }

    #[test]
    fn test_verify_wrong_message() {
        let (signing_key, public_key) = generate_keypair();
        let signature = sign_message(&signing_key, b"original message");

        assert!(!verify(b"different message", &public_key, &signature));
    }

    #[test]
    fn test_verify_wrong_key() {
        let (signing_key, _) = generate_keypair();
        let (_, other_public_key) = generate_keypair();
        let signature = sign_message(&signing_key, b"message");

        assert!(!verify(b"message", &other_public_key, &signature));
    }

    #[test]
    fn test_verify_garbage_inputs() {
        assert!(!verify(b"message", "not base64 at all!!", "???"));
        // Wrong lengths after successful decode
        let short_key = URL_SAFE_NO_PAD.encode([0u8; 16]);
        let short_sig = URL_SAFE_NO_PAD.encode([0u8; 32]);
        assert!(!verify(b"message", &short_key, &short_sig));
    }
}
