use serde::{Deserialize, Serialize};

/// Current persisted payload format.
pub const PAYLOAD_VERSION: u32 = 1;

/// Identifier of the only supported key derivation function.
pub const KDF_PBKDF2_SHA256: &str = "PBKDF2-SHA256";

/// The encrypted-at-rest record stored under the encrypted state key.
///
/// Binary material (`salt`, `iv`, `ciphertext`) is base64 text. The iteration
/// count travels with the ciphertext so that decryption always uses the count
/// that was active when the payload was written.
///
/// Payloads written before the version and KDF fields existed are read as
/// version 1 with PBKDF2; a missing iteration count reads as `0` and is
/// replaced by the default at unlock time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultPayload {
    #[serde(default = "default_version")]
    pub v: u32,
    #[serde(default = "default_kdf")]
    pub kdf: String,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub ciphertext: String,
}

fn default_version() -> u32 {
    PAYLOAD_VERSION
}

fn default_kdf() -> String {
    KDF_PBKDF2_SHA256.to_string()
}
