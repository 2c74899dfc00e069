//! Ed25519 challenge signing.
//!
//! The platform validates a webhook by sending `op = 13` with a
//! `plain_token` and an `event_ts`. The bot answers with the hex-encoded
//! Ed25519 signature of `event_ts ++ plain_token`, made with a key seeded
//! by the first 32 bytes of the bot secret.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::SignatureError;

/// Bytes of the secret used as the Ed25519 seed.
pub const SEED_LEN: usize = 32;

/// Takes the first 32 bytes of `secret` as the key seed.
///
/// Shorter secrets are rejected, longer ones are truncated.
pub fn derive_seed(secret: &str) -> Result<[u8; SEED_LEN], SignatureError> {
    secret
        .as_bytes()
        .get(..SEED_LEN)
        .and_then(|seed| seed.try_into().ok())
        .ok_or(SignatureError::SecretTooShort { len: secret.len() })
}

/// Returns the raw public key derived from `secret`.
pub fn public_key(secret: &str) -> Result<[u8; 32], SignatureError> {
    Ok(ChallengeSigner::new(secret)?.public_key())
}

/// Signs handshake challenges with the key derived from the bot secret.
#[derive(Clone)]
pub struct ChallengeSigner {
    key: SigningKey,
}

impl ChallengeSigner {
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let seed = derive_seed(secret)?;
        Ok(Self {
            key: SigningKey::from_bytes(&seed),
        })
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Lowercase hex signature of `event_ts ++ plain_token`.
    pub fn sign_challenge(&self, event_ts: &str, plain_token: &str) -> String {
        let message = format!("{event_ts}{plain_token}");
        hex::encode(self.key.sign(message.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for ChallengeSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeSigner")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

/// Checks a hex signature produced by [`ChallengeSigner::sign_challenge`].
pub fn verify_challenge(
    public_key: &[u8; 32],
    event_ts: &str,
    plain_token: &str,
    signature_hex: &str,
) -> Result<(), SignatureError> {
    let key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;
    let bytes: [u8; 64] = hex::decode(signature_hex)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?
        .try_into()
        .map_err(|v: Vec<u8>| SignatureError::Malformed(format!("{} bytes", v.len())))?;
    let message = format!("{event_ts}{plain_token}");
    key.verify(message.as_bytes(), &Signature::from_bytes(&bytes))
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let secret = "s".repeat(40);
        let signer = ChallengeSigner::new(&secret).unwrap();
        let signature = signer.sign_challenge("123", "tok");

        assert_eq!(signature.len(), 128);
        assert!(signature.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));

        let key = public_key(&secret).unwrap();
        verify_challenge(&key, "123", "tok", &signature).unwrap();
        assert_eq!(
            verify_challenge(&key, "123", "tampered", &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_seed_is_first_32_bytes() {
        let long = format!("{}{}", "k".repeat(32), "ignored");
        let exact = "k".repeat(32);
        assert_eq!(public_key(&long).unwrap(), public_key(&exact).unwrap());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert_eq!(
            ChallengeSigner::new("short").unwrap_err(),
            SignatureError::SecretTooShort { len: 5 }
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = ChallengeSigner::new(&"x".repeat(32)).unwrap();
        let debug = format!("{signer:?}");
        assert!(debug.contains("public_key"));
        assert!(!debug.contains("xxxxxxxx"));
    }
}
