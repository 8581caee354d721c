use std::sync::{Arc, Mutex as StdMutex};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use zeroize::Zeroizing;

use super::{LockState, VaultConfig, VaultError, VaultSession};
use crate::db::Database;
use crate::models::{AppState, Theme};

/// User activity that keeps an unlocked vault from auto-locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Pointer,
    Movement,
    Touch,
    Scroll,
    Key,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Movement => "movement",
            Self::Touch => "touch",
            Self::Scroll => "scroll",
            Self::Key => "key",
        }
    }
}

/// Shareable async handle to a [`VaultSession`].
///
/// Operations are serialized through one mutex. Key derivation runs on the
/// blocking pool while the mutex is held. An unlocked vault carries an
/// auto-lock timer task which is replaced whenever the idle deadline moves.
#[derive(Clone)]
pub struct Vault {
    session: Arc<Mutex<VaultSession>>,
    timer: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl Vault {
    pub fn new(session: VaultSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            timer: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn open(db: Database, config: VaultConfig) -> Result<Self, VaultError> {
        Ok(Self::new(VaultSession::open(db, config)?))
    }

    pub async fn lock_state(&self) -> LockState {
        self.session.lock().await.lock_state()
    }

    pub async fn is_vault_present(&self) -> bool {
        self.session.lock().await.is_vault_present()
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    pub async fn setup(&self, passphrase: &str) -> Result<(), VaultError> {
        let passphrase = Zeroizing::new(passphrase.to_owned());
        self.open_session(move |s| s.setup(&passphrase)).await
    }

    pub async fn unlock(&self, passphrase: &str) -> Result<(), VaultError> {
        let passphrase = Zeroizing::new(passphrase.to_owned());
        self.open_session(move |s| s.unlock(&passphrase)).await
    }

    pub async fn rotate(&self, new_passphrase: &str) -> Result<(), VaultError> {
        let passphrase = Zeroizing::new(new_passphrase.to_owned());
        self.run_blocking(move |s| s.rotate(&passphrase)).await?;
        Ok(())
    }

    pub async fn lock(&self) {
        let mut session = self.session.lock().await;
        session.lock();
        self.cancel_timer();
    }

    /// Cancel the auto-lock timer and lock. Used on server shutdown.
    pub async fn shutdown(&self) {
        self.lock().await;
    }

    /// Unlock the session and arm its timer in a detached task, so a caller
    /// that stops waiting cannot leave the vault unlocked without a deadline.
    async fn open_session<F>(&self, f: F) -> Result<(), VaultError>
    where
        F: FnOnce(&mut VaultSession) -> Result<(), VaultError> + Send + 'static,
    {
        let vault = self.clone();
        tokio::spawn(async move {
            let (mut session, ()) = vault.run_blocking(f).await?;
            vault.arm(&mut session);
            Ok(())
        })
        .await
        .map_err(VaultError::internal)?
    }

    /// Run a session operation on the blocking pool, handing the held guard
    /// back on success.
    async fn run_blocking<T, F>(&self, f: F) -> Result<(OwnedMutexGuard<VaultSession>, T), VaultError>
    where
        F: FnOnce(&mut VaultSession) -> Result<T, VaultError> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = self.session.clone().lock_owned().await;
        let (guard, result) = tokio::task::spawn_blocking(move || {
            let result = f(&mut *guard);
            (guard, result)
        })
        .await
        .map_err(VaultError::internal)?;
        result.map(|value| (guard, value))
    }

    // ============================================================
    // Auto-lock
    // ============================================================

    /// Register user activity. Replaces the idle deadline of an unlocked
    /// vault; ignored otherwise.
    pub async fn record_activity(&self, kind: ActivityKind) {
        let mut session = self.session.lock().await;
        if session.is_unlocked() {
            tracing::trace!("Activity: {}", kind.as_str());
            self.arm(&mut session);
        }
    }

    pub async fn idle_deadline(&self) -> Option<Instant> {
        self.session.lock().await.idle_deadline()
    }

    fn arm(&self, session: &mut VaultSession) {
        match session.touch(Instant::now()) {
            Some(deadline) => self.schedule(deadline),
            None => self.cancel_timer(),
        }
    }

    fn schedule(&self, deadline: Instant) {
        let session = Arc::downgrade(&self.session);
        let task = tokio::spawn(async move {
            sleep_until(deadline).await;
            let Some(session) = session.upgrade() else {
                return;
            };
            let mut session = session.lock().await;
            if session.lock_if_idle(Instant::now()) {
                tracing::info!("Vault auto-locked after inactivity");
            }
        });

        let mut timer = self.timer.lock().expect("timer lock poisoned");
        if let Some(previous) = timer.replace(task) {
            previous.abort();
        }
    }

    fn cancel_timer(&self) {
        let mut timer = self.timer.lock().expect("timer lock poisoned");
        if let Some(task) = timer.take() {
            task.abort();
        }
    }

    // ============================================================
    // Document
    // ============================================================

    /// Snapshot of the current document.
    pub async fn state(&self) -> Result<AppState, VaultError> {
        self.session.lock().await.state().cloned()
    }

    /// See [`VaultSession::mutate`].
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, VaultError>
    where
        F: FnOnce(&mut AppState) -> Result<T, VaultError>,
    {
        self.session.lock().await.mutate(f)
    }

    pub async fn undo(&self) -> Result<bool, VaultError> {
        self.session.lock().await.undo()
    }

    pub async fn redo(&self) -> Result<bool, VaultError> {
        self.session.lock().await.redo()
    }

    pub async fn history_depths(&self) -> (usize, usize) {
        self.session.lock().await.history_depths()
    }

    pub async fn theme(&self) -> Result<Theme, VaultError> {
        self.session.lock().await.theme()
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), VaultError> {
        self.session.lock().await.set_theme(theme)
    }
}
