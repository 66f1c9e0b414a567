//! Password-based AES-256-GCM
//!
//! Design notes:
//! - Argon2id stretches the secret with a fresh 16-byte salt per message.
//! - AES-256-GCM with a fresh 12-byte nonce; the tag is verified before any
//!   plaintext is released.
//! - Output is `base64(salt || nonce || ciphertext || tag)` so it survives
//!   being pasted into a page or a QR code.

use crate::domain::repositories::{CipherError, PasswordCipher};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Argon2 salt length in bytes
pub const SALT_LEN: usize = 16;
/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;
/// AES-GCM tag length in bytes
pub const TAG_LEN: usize = 16;
/// Derived key length in bytes
pub const KEY_LEN: usize = 32;
/// Entropy of a generated secret in bytes
pub const SECRET_LEN: usize = 32;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherOptions {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for CipherOptions {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl CipherOptions {
    /// Minimal cost, for constrained hosts and test suites
    pub fn lightweight() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Argon2id + AES-256-GCM password cipher
pub struct AesGcmCipher {
    kdf: Argon2<'static>,
}

impl AesGcmCipher {
    /// Creates a cipher, validating the KDF parameters
    pub fn new(options: CipherOptions) -> Result<Self, CipherError> {
        let params = Params::new(
            options.memory_kib,
            options.iterations,
            options.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;

        Ok(Self {
            kdf: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    fn derive_key(&self, secret: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CipherError> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        self.kdf
            .hash_password_into(secret.as_bytes(), salt, &mut *key)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }
}

impl PasswordCipher for AesGcmCipher {
    fn generate_key(&self) -> String {
        let mut bytes = Zeroizing::new([0u8; SECRET_LEN]);
        rand::thread_rng().fill_bytes(&mut *bytes);
        STANDARD.encode(&*bytes)
    }

    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError> {
        let mut rng = rand::thread_rng();

        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);

        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let key = self.derive_key(secret, &salt)?;
        let cipher = Aes256Gcm::new_from_slice(&*key)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::Encryption("AES-GCM seal failed".into()))?;

        let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&sealed);

        Ok(STANDARD.encode(envelope))
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, CipherError> {
        let compact: String = ciphertext.chars().filter(|c| !c.is_whitespace()).collect();
        let envelope = STANDARD
            .decode(compact)
            .map_err(|_| CipherError::Authentication)?;

        if envelope.len() < self.envelope_overhead() {
            return Err(CipherError::Authentication);
        }

        let (salt, rest) = envelope.split_at(SALT_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let key = self
            .derive_key(secret, salt)
            .map_err(|_| CipherError::Authentication)?;
        let cipher = Aes256Gcm::new_from_slice(&*key).map_err(|_| CipherError::Authentication)?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(nonce), sealed)
                .map_err(|_| CipherError::Authentication)?,
        );

        String::from_utf8(plaintext.to_vec()).map_err(|_| CipherError::Authentication)
    }

    fn envelope_overhead(&self) -> usize {
        SALT_LEN + NONCE_LEN + TAG_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::looks_like_ciphertext;

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::new(CipherOptions::lightweight()).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let c = cipher();
        let ct = c.encrypt("secret message", "correct horse").unwrap();
        assert_eq!(c.decrypt(&ct, "correct horse").unwrap(), "secret message");
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let c = cipher();
        let ct = c.encrypt("", "k").unwrap();
        assert_eq!(c.decrypt(&ct, "k").unwrap(), "");
    }

    #[test]
    fn test_wrong_secret_fails_closed() {
        let c = cipher();
        let ct = c.encrypt("payload", "a").unwrap();
        assert_eq!(c.decrypt(&ct, "b"), Err(CipherError::Authentication));
    }

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let c = cipher();
        let ct = c.encrypt("payload", "k").unwrap();
        let mut raw = STANDARD.decode(&ct).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);
        assert_eq!(c.decrypt(&tampered, "k"), Err(CipherError::Authentication));
    }

    #[test]
    fn test_malformed_input_fails_closed() {
        let c = cipher();
        assert_eq!(c.decrypt("", "k"), Err(CipherError::Authentication));
        assert_eq!(c.decrypt("!!not base64!!", "k"), Err(CipherError::Authentication));
        assert_eq!(c.decrypt("QUJDRA==", "k"), Err(CipherError::Authentication));
    }

    #[test]
    fn test_output_is_randomized() {
        let c = cipher();
        let a = c.encrypt("same", "k").unwrap();
        let b = c.encrypt("same", "k").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_passes_classifier() {
        let c = cipher();
        let ct = c.encrypt("hi", "k").unwrap();
        assert!(looks_like_ciphertext(&ct));
    }

    #[test]
    fn test_wrapped_ciphertext_accepted() {
        let c = cipher();
        let ct = c.encrypt("wrapped", "k").unwrap();
        let wrapped = format!("  {}\n{}  ", &ct[..20], &ct[20..]);
        assert_eq!(c.decrypt(&wrapped, "k").unwrap(), "wrapped");
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let c = cipher();
        let a = c.generate_key();
        let b = c.generate_key();
        assert_ne!(a, b);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), SECRET_LEN);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let options = CipherOptions {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(matches!(
            AesGcmCipher::new(options),
            Err(CipherError::KeyDerivation(_))
        ));
    }
}
