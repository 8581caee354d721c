use std::time::Duration;

use crate::history::DEFAULT_UNDO_DEPTH;

/// Default PBKDF2 iteration count for newly written payloads.
pub const DEFAULT_KDF_ITERATIONS: u32 = 210_000;

/// Default idle window before the vault locks itself.
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(10 * 60);

/// Longest idle window accepted from configuration.
pub const MAX_AUTO_LOCK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Minimum passphrase length, in characters.
pub const MIN_PASSPHRASE_CHARS: usize = 8;

/// Tunables for a vault session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    /// Iteration count used when a payload is written by setup or rotation.
    /// Unlock always uses the count stored in the payload.
    pub kdf_iterations: u32,
    /// Maximum number of undo entries.
    pub undo_depth: usize,
    /// Idle window before auto-lock.
    pub auto_lock: Duration,
}

impl VaultConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything unset or unparseable.
    ///
    /// - `SHADOWBOARD_KDF_ITERATIONS`
    /// - `SHADOWBOARD_UNDO_DEPTH`
    /// - `SHADOWBOARD_AUTO_LOCK_SECS`
    pub fn from_env() -> Self {
        let kdf_iterations = std::env::var("SHADOWBOARD_KDF_ITERATIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_KDF_ITERATIONS);

        let undo_depth = std::env::var("SHADOWBOARD_UNDO_DEPTH")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_UNDO_DEPTH);

        let auto_lock = std::env::var("SHADOWBOARD_AUTO_LOCK_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map(Duration::from_secs)
            .filter(|window| *window <= MAX_AUTO_LOCK)
            .unwrap_or(DEFAULT_AUTO_LOCK);

        Self {
            kdf_iterations,
            undo_depth,
            auto_lock,
        }
    }

    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations.max(1);
        self
    }

    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = depth;
        self
    }

    pub fn with_auto_lock(mut self, window: Duration) -> Self {
        self.auto_lock = window.min(MAX_AUTO_LOCK);
        self
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            undo_depth: DEFAULT_UNDO_DEPTH,
            auto_lock: DEFAULT_AUTO_LOCK,
        }
    }
}
