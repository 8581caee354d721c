//! The vault lifecycle as a synchronous, single-owner state machine.
//!
//! ```text
//! Uninitialized --setup--> Unlocked --lock/auto-lock--> Locked --unlock--> Unlocked
//! ```
//!
//! While unlocked the session holds the derived key, the salt and the
//! iteration count of the stored payload. Every committed change re-encrypts
//! the whole document under that key with a fresh nonce. Locking drops the
//! key (which wipes it) and replaces the document with an empty one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use zeroize::Zeroizing;

use super::config::{
    VaultConfig, DEFAULT_AUTO_LOCK, DEFAULT_KDF_ITERATIONS, MIN_PASSPHRASE_CHARS,
};
use super::legacy::{take_legacy_state, MigrationOutcome};
use super::store::{self, StoredPayload};
use super::VaultError;
use crate::crypto::{self, codec, Key};
use crate::db::Database;
use crate::history::History;
use crate::models::{
    normalize, AppState, Theme, VaultPayload, KDF_PBKDF2_SHA256, PAYLOAD_VERSION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No encrypted payload has been written yet.
    Uninitialized,
    Locked,
    Unlocked,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key material held only while unlocked.
struct SessionKey {
    key: Key,
    salt: Vec<u8>,
    iterations: u32,
}

impl SessionKey {
    fn derive(passphrase: &str, salt: Vec<u8>, iterations: u32) -> Self {
        Self {
            key: crypto::derive(passphrase, &salt, iterations),
            salt,
            iterations,
        }
    }

    /// Encrypt `state` into a payload ready to be stored.
    fn seal(&self, state: &AppState) -> Result<VaultPayload, VaultError> {
        let plaintext = Zeroizing::new(serde_json::to_vec(state).map_err(VaultError::internal)?);
        let sealed = crypto::encrypt(&self.key, &plaintext).map_err(VaultError::internal)?;
        Ok(VaultPayload {
            v: PAYLOAD_VERSION,
            kdf: KDF_PBKDF2_SHA256.to_string(),
            iterations: self.iterations,
            salt: codec::encode(&self.salt),
            iv: codec::encode(&sealed.nonce),
            ciphertext: codec::encode(&sealed.ciphertext),
        })
    }
}

pub struct VaultSession {
    db: Database,
    config: VaultConfig,
    lock_state: LockState,
    /// Document handed to `setup`, possibly migrated from legacy storage.
    bootstrap: AppState,
    state: AppState,
    key: Option<SessionKey>,
    history: History,
    idle_deadline: Option<Instant>,
}

impl VaultSession {
    /// Open the vault stored in `db`.
    ///
    /// When no encrypted payload exists yet, legacy plaintext data is
    /// migrated into the bootstrap document and its key deleted.
    pub fn open(db: Database, config: VaultConfig) -> Result<Self, VaultError> {
        let stored = store::read_payload(&db)?;

        let (lock_state, bootstrap) = if stored.is_present() {
            (LockState::Locked, AppState::default())
        } else {
            let bootstrap = match take_legacy_state(&db)? {
                MigrationOutcome::Migrated(state) => state,
                MigrationOutcome::NoLegacyData => AppState::default(),
            };
            (LockState::Uninitialized, bootstrap)
        };

        let state = AppState::default();
        let history = History::new(&state, config.undo_depth).map_err(VaultError::internal)?;

        tracing::debug!("Opened vault in state {}", lock_state);
        Ok(Self {
            db,
            config,
            lock_state,
            bootstrap,
            state,
            key: None,
            history,
            idle_deadline: None,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn is_vault_present(&self) -> bool {
        self.lock_state != LockState::Uninitialized
    }

    pub fn is_unlocked(&self) -> bool {
        self.lock_state == LockState::Unlocked
    }

    fn transition_error(&self, action: &'static str) -> VaultError {
        VaultError::InvalidTransition {
            state: self.lock_state,
            action,
        }
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Create the vault from the bootstrap document.
    pub fn setup(&mut self, passphrase: &str) -> Result<(), VaultError> {
        if self.lock_state != LockState::Uninitialized {
            return Err(self.transition_error("set up"));
        }
        check_passphrase(passphrase)?;

        let key = SessionKey::derive(
            passphrase,
            crypto::generate_salt().to_vec(),
            self.config.kdf_iterations,
        );
        let state = self.bootstrap.clone();
        store::write_payload(&self.db, &key.seal(&state)?)?;
        self.history.reset(&state).map_err(VaultError::internal)?;

        self.bootstrap = AppState::default();
        self.state = state;
        self.key = Some(key);
        self.lock_state = LockState::Unlocked;
        self.idle_deadline = None;
        tracing::info!("Vault created");
        Ok(())
    }

    /// Decrypt the stored payload.
    ///
    /// Every way this can fail after the state check is the same
    /// [`VaultError::UnlockFailure`].
    pub fn unlock(&mut self, passphrase: &str) -> Result<(), VaultError> {
        if self.lock_state != LockState::Locked {
            return Err(self.transition_error("unlock"));
        }

        let (key, state) = match self.open_payload(passphrase)? {
            Some(opened) => opened,
            None => {
                tracing::warn!("Vault unlock failed");
                return Err(VaultError::UnlockFailure);
            }
        };
        self.history.reset(&state).map_err(VaultError::internal)?;

        self.state = state;
        self.key = Some(key);
        self.lock_state = LockState::Unlocked;
        self.idle_deadline = None;
        tracing::info!("Vault unlocked");
        Ok(())
    }

    /// Storage errors propagate; anything wrong with the payload itself is
    /// `None`.
    fn open_payload(&self, passphrase: &str) -> Result<Option<(SessionKey, AppState)>, VaultError> {
        let payload = match store::read_payload(&self.db)? {
            StoredPayload::Present(payload) => payload,
            StoredPayload::Absent | StoredPayload::Corrupt => return Ok(None),
        };
        if payload.v != PAYLOAD_VERSION || payload.kdf != KDF_PBKDF2_SHA256 {
            tracing::debug!("Unsupported payload v={} kdf={}", payload.v, payload.kdf);
            return Ok(None);
        }

        let (Ok(salt), Ok(nonce), Ok(ciphertext)) = (
            codec::decode(&payload.salt),
            codec::decode(&payload.iv),
            codec::decode(&payload.ciphertext),
        ) else {
            return Ok(None);
        };
        let iterations = if payload.iterations == 0 {
            DEFAULT_KDF_ITERATIONS
        } else {
            payload.iterations
        };

        let key = SessionKey::derive(passphrase, salt, iterations);
        let Ok(plaintext) = crypto::decrypt(&key.key, &nonce, &ciphertext).map(Zeroizing::new)
        else {
            return Ok(None);
        };
        let Ok(value) = serde_json::from_slice::<Value>(&plaintext) else {
            return Ok(None);
        };
        Ok(Some((key, normalize(&value))))
    }

    /// Drop the key and the document. Safe to call in any state.
    pub fn lock(&mut self) {
        self.idle_deadline = None;
        if self.lock_state != LockState::Unlocked {
            return;
        }
        self.key = None;
        self.state = AppState::default();
        self.history.clear();
        self.lock_state = LockState::Locked;
        tracing::info!("Vault locked");
    }

    /// Re-encrypt under a new passphrase with a fresh salt and the
    /// configured iteration count.
    pub fn rotate(&mut self, new_passphrase: &str) -> Result<(), VaultError> {
        if self.lock_state != LockState::Unlocked {
            return Err(self.transition_error("rotate the passphrase"));
        }
        check_passphrase(new_passphrase)?;

        let key = SessionKey::derive(
            new_passphrase,
            crypto::generate_salt().to_vec(),
            self.config.kdf_iterations,
        );
        store::write_payload(&self.db, &key.seal(&self.state)?)?;
        self.key = Some(key);
        tracing::info!("Vault passphrase rotated");
        Ok(())
    }

    // ============================================================
    // Document access
    // ============================================================

    pub fn state(&self) -> Result<&AppState, VaultError> {
        self.require_unlocked()?;
        Ok(&self.state)
    }

    fn require_unlocked(&self) -> Result<&SessionKey, VaultError> {
        match (&self.lock_state, &self.key) {
            (LockState::Unlocked, Some(key)) => Ok(key),
            _ => Err(VaultError::Locked),
        }
    }

    /// Apply `f` to a working copy of the document.
    ///
    /// On success the copy is persisted, recorded in history and becomes the
    /// current document. On error nothing changes.
    pub fn mutate<T, F>(&mut self, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut AppState) -> Result<T, VaultError>,
    {
        let key = self.require_unlocked()?;
        let mut working = self.state.clone();
        let output = f(&mut working)?;

        store::write_payload(&self.db, &key.seal(&working)?)?;
        self.history.record(&working).map_err(VaultError::internal)?;
        self.state = working;
        Ok(output)
    }

    /// Step back one change. Returns whether anything was undone.
    pub fn undo(&mut self) -> Result<bool, VaultError> {
        self.require_unlocked()?;
        let Some(previous) = self.history.undo(&self.state).map_err(VaultError::internal)? else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&previous) {
            let _ = self.history.redo(&previous);
            return Err(e);
        }
        self.state = previous;
        Ok(true)
    }

    /// Re-apply the most recently undone change. Returns whether anything
    /// was redone.
    pub fn redo(&mut self) -> Result<bool, VaultError> {
        self.require_unlocked()?;
        let Some(next) = self.history.redo(&self.state).map_err(VaultError::internal)? else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&next) {
            let _ = self.history.undo(&next);
            return Err(e);
        }
        self.state = next;
        Ok(true)
    }

    fn persist(&self, state: &AppState) -> Result<(), VaultError> {
        let key = self.require_unlocked()?;
        store::write_payload(&self.db, &key.seal(state)?)
    }

    /// `(undo, redo)` stack sizes.
    pub fn history_depths(&self) -> (usize, usize) {
        (self.history.undo_len(), self.history.redo_len())
    }

    // ============================================================
    // Idle tracking
    // ============================================================

    /// Push the idle deadline out to `now` plus the auto-lock window.
    /// Only an unlocked vault has a deadline.
    pub fn touch(&mut self, now: Instant) -> Option<Instant> {
        let window = self.config.auto_lock;
        self.idle_deadline = self
            .is_unlocked()
            .then(|| now.checked_add(window).unwrap_or(now + DEFAULT_AUTO_LOCK));
        self.idle_deadline
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    /// Lock if the idle deadline has passed. Returns whether it locked.
    pub fn lock_if_idle(&mut self, now: Instant) -> bool {
        match self.idle_deadline {
            Some(deadline) if self.is_unlocked() && now >= deadline => {
                self.lock();
                true
            }
            _ => false,
        }
    }

    // ============================================================
    // Preferences
    // ============================================================

    pub fn theme(&self) -> Result<Theme, VaultError> {
        store::read_theme(&self.db)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), VaultError> {
        store::write_theme(&self.db, theme)
    }
}

fn check_passphrase(passphrase: &str) -> Result<(), VaultError> {
    if passphrase.chars().count() < MIN_PASSPHRASE_CHARS {
        return Err(VaultError::WeakPassphrase {
            min: MIN_PASSPHRASE_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db::ENCRYPTED_STATE_KEY;
    use crate::models::CreateRiskInput;

    fn session() -> VaultSession {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        VaultSession::open(db, VaultConfig::default().with_kdf_iterations(1)).unwrap()
    }

    fn add_risk(session: &mut VaultSession) {
        session
            .mutate(|state| {
                state.add_risk(CreateRiskInput {
                    title: "Burnout".into(),
                    probability: 4,
                    impact: 9,
                })?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn starts_uninitialized_without_payload() {
        let session = session();
        assert_eq!(session.lock_state(), LockState::Uninitialized);
        assert!(!session.is_vault_present());
        assert_eq!(session.state(), Err(VaultError::Locked));
    }

    #[test]
    fn passphrase_length_counts_characters() {
        assert!(check_passphrase("ééééééé").is_err());
        assert!(check_passphrase("éééééééé").is_ok());
        assert_eq!(
            check_passphrase("short"),
            Err(VaultError::WeakPassphrase { min: 8 })
        );
    }

    #[test]
    fn setup_writes_a_versioned_payload() {
        let mut session = session();
        session.setup("correcthorsebattery").unwrap();
        assert_eq!(session.lock_state(), LockState::Unlocked);

        let raw = session.db.get_value(ENCRYPTED_STATE_KEY).unwrap().unwrap();
        let payload: VaultPayload = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload.v, 1);
        assert_eq!(payload.kdf, "PBKDF2-SHA256");
        assert_eq!(payload.iterations, 1);
        assert_eq!(codec::decode(&payload.salt).unwrap().len(), 16);
        assert_eq!(codec::decode(&payload.iv).unwrap().len(), 12);
        assert!(!raw.contains("missions"));
    }

    #[test]
    fn wrong_state_transitions_are_rejected() {
        let mut session = session();
        assert!(matches!(
            session.unlock("correcthorsebattery"),
            Err(VaultError::InvalidTransition {
                state: LockState::Uninitialized,
                ..
            })
        ));
        session.setup("correcthorsebattery").unwrap();
        assert!(matches!(
            session.setup("correcthorsebattery"),
            Err(VaultError::InvalidTransition { .. })
        ));
        session.lock();
        assert!(matches!(
            session.rotate("anotherpassphrase"),
            Err(VaultError::InvalidTransition {
                state: LockState::Locked,
                ..
            })
        ));
    }

    #[test]
    fn failed_mutation_changes_nothing() {
        let mut session = session();
        session.setup("correcthorsebattery").unwrap();
        let before = session.db.get_value(ENCRYPTED_STATE_KEY).unwrap();

        let result: Result<(), _> = session.mutate(|state| {
            state.add_risk(CreateRiskInput {
                title: "Half done".into(),
                probability: 2,
                impact: 2,
            })?;
            Err(VaultError::Invalid("nope".into()))
        });
        assert_eq!(result, Err(VaultError::Invalid("nope".into())));
        assert!(session.state().unwrap().risk_points.is_empty());
        assert_eq!(session.history_depths(), (0, 0));
        assert_eq!(session.db.get_value(ENCRYPTED_STATE_KEY).unwrap(), before);
    }

    #[test]
    fn every_change_is_persisted() {
        let mut session = session();
        session.setup("correcthorsebattery").unwrap();
        let first = session.db.get_value(ENCRYPTED_STATE_KEY).unwrap();
        add_risk(&mut session);
        let second = session.db.get_value(ENCRYPTED_STATE_KEY).unwrap();
        assert_ne!(first, second);
        session.undo().unwrap();
        assert_ne!(session.db.get_value(ENCRYPTED_STATE_KEY).unwrap(), second);
    }

    #[test]
    fn lock_clears_document_history_and_deadline() {
        let mut session = session();
        session.setup("correcthorsebattery").unwrap();
        add_risk(&mut session);
        session.touch(Instant::now());

        session.lock();
        assert_eq!(session.lock_state(), LockState::Locked);
        assert_eq!(session.history_depths(), (0, 0));
        assert!(session.idle_deadline().is_none());
        assert_eq!(session.undo(), Err(VaultError::Locked));

        session.unlock("correcthorsebattery").unwrap();
        assert_eq!(session.state().unwrap().risk_points.len(), 1);
        assert_eq!(session.history_depths(), (0, 0));
    }

    #[test]
    fn lock_if_idle_respects_deadline() {
        let mut session = session();
        session.setup("correcthorsebattery").unwrap();
        let start = Instant::now();
        assert!(!session.lock_if_idle(start));

        session.touch(start);
        assert!(!session.lock_if_idle(start + Duration::from_secs(599)));
        assert!(session.lock_if_idle(start + Duration::from_secs(600)));
        assert_eq!(session.lock_state(), LockState::Locked);
        assert!(session.touch(start).is_none());
    }

    #[test]
    fn oversized_window_falls_back_to_default() {
        let mut session = session();
        session.config.auto_lock = Duration::MAX;
        session.setup("correcthorsebattery").unwrap();

        let start = Instant::now();
        assert_eq!(session.touch(start), Some(start + DEFAULT_AUTO_LOCK));
    }
}
