//! Cipher adapters

mod aes_gcm_cipher;

pub use aes_gcm_cipher::{AesGcmCipher, CipherOptions, KEY_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
