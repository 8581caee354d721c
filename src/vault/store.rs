//! Typed access to the vault's entries in the blob store.

use serde_json::Value;

use super::VaultError;
use crate::db::{Database, ENCRYPTED_STATE_KEY, THEME_KEY};
use crate::models::{Theme, VaultPayload};

/// What is stored under the encrypted state key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPayload {
    /// Nothing usable: no entry, or text that is not a JSON object.
    Absent,
    /// A JSON object that does not have the payload shape. The vault counts
    /// as present but cannot be unlocked.
    Corrupt,
    Present(VaultPayload),
}

impl StoredPayload {
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    fn parse(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) | Err(_) => {
                tracing::warn!("Ignoring malformed encrypted payload");
                return Self::Absent;
            }
        };
        match serde_json::from_value(value) {
            Ok(payload) => Self::Present(payload),
            Err(e) => {
                tracing::warn!("Encrypted payload has an unexpected shape: {}", e);
                Self::Corrupt
            }
        }
    }
}

pub fn read_payload(db: &Database) -> Result<StoredPayload, VaultError> {
    let raw = db
        .get_value(ENCRYPTED_STATE_KEY)
        .map_err(VaultError::storage)?;
    Ok(match raw {
        Some(raw) => StoredPayload::parse(&raw),
        None => StoredPayload::Absent,
    })
}

pub fn write_payload(db: &Database, payload: &VaultPayload) -> Result<(), VaultError> {
    let json = serde_json::to_string(payload).map_err(VaultError::internal)?;
    db.set_value(ENCRYPTED_STATE_KEY, &json)
        .map_err(VaultError::storage)
}

/// Stored theme preference. Unknown or missing values read as `auto`.
pub fn read_theme(db: &Database) -> Result<Theme, VaultError> {
    let raw = db.get_value(THEME_KEY).map_err(VaultError::storage)?;
    Ok(raw
        .as_deref()
        .and_then(|s| Theme::from_str(s.trim()))
        .unwrap_or_default())
}

pub fn write_theme(db: &Database, theme: Theme) -> Result<(), VaultError> {
    db.set_value(THEME_KEY, theme.as_str())
        .map_err(VaultError::storage)
}
