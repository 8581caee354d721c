use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// A derived symmetric key. Wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key with PBKDF2-HMAC-SHA256.
///
/// No passphrase policy is applied here; callers enforce the minimum length.
/// `iterations` must be positive.
pub fn derive(passphrase: &str, salt: &[u8], iterations: u32) -> Key {
    debug_assert!(iterations > 0);
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut key);
    let derived = Key(key);
    key.zeroize();
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc7914_vector() {
        // PBKDF2-HMAC-SHA256, P="passwd", S="salt", c=1
        let key = derive("passwd", b"salt", 1);
        assert_eq!(
            &key.as_bytes()[..8],
            &[0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn is_deterministic_per_salt_and_count() {
        let salt = generate_salt();
        assert_eq!(derive("pass1234", &salt, 10).as_bytes(), derive("pass1234", &salt, 10).as_bytes());
        assert_ne!(derive("pass1234", &salt, 10).as_bytes(), derive("pass1234", &salt, 11).as_bytes());
        assert_ne!(derive("pass1234", &salt, 10).as_bytes(), derive("pass1235", &salt, 10).as_bytes());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn debug_does_not_print_key_bytes() {
        assert_eq!(format!("{:?}", derive("pass1234", b"salt", 1)), "Key(..)");
    }
}
