//! Cryptographic building blocks for the vault.
//!
//! - [`codec`]: base64 text encoding for binary material stored in JSON.
//! - [`kdf`]: PBKDF2-HMAC-SHA256 passphrase-to-key derivation.
//! - [`cipher`]: AES-256-GCM sealing of the serialized document.
//!
//! Every failure that could tell a caller *why* a decryption did not work is
//! collapsed into [`CryptoError::AuthenticationFailure`].

pub mod cipher;
pub mod codec;
pub mod kdf;

use thiserror::Error;

pub use cipher::{decrypt, encrypt, Sealed, NONCE_LEN};
pub use kdf::{derive, generate_salt, Key, KEY_LEN, SALT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Wrong key, tampered data, truncated data or malformed nonce.
    #[error("authentication failed")]
    AuthenticationFailure,

    #[error("encryption failed")]
    Encryption,
}
