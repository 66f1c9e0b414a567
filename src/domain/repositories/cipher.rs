//! Password-based cipher trait
//!
//! Contract for the authenticated cipher behind the crypto surface. The
//! concrete algorithm lives in the infrastructure layer.

use thiserror::Error;

/// Errors raised by cipher operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Wrong secret, tampered or malformed ciphertext. Never partial output.
    #[error("authentication failed")]
    Authentication,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),
}

/// Password-based authenticated encryption
pub trait PasswordCipher: Send + Sync {
    /// Fresh high-entropy secret usable as a password
    fn generate_key(&self) -> String;

    /// Encrypts to text-safe output; repeated calls yield different output
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError>;

    /// Decrypts, failing with [`CipherError::Authentication`] on any mismatch
    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String, CipherError>;

    /// Minimum decoded byte length of any valid ciphertext
    fn envelope_overhead(&self) -> usize;
}
