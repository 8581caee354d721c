use thiserror::Error;

use super::LockState;
use crate::models::DomainError;

/// Everything the vault lifecycle can report to a caller.
///
/// Failures that would reveal why an unlock did not work (bad passphrase,
/// tampered bytes, unknown format) are all [`VaultError::UnlockFailure`].
/// Storage and serialization details are logged where they happen and only
/// a short description is carried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("vault is locked")]
    Locked,

    #[error("unlock failed")]
    UnlockFailure,

    #[error("passphrase must be at least {min} characters")]
    WeakPassphrase { min: usize },

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: LockState,
        action: &'static str,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VaultError {
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        tracing::error!("Vault storage error: {}", err);
        Self::Storage(err.to_string())
    }

    pub(crate) fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Vault internal error: {}", err);
        Self::Internal(err.to_string())
    }
}

impl From<DomainError> for VaultError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Invalid(msg) => Self::Invalid(msg),
            DomainError::NotFound(what) => Self::NotFound(what),
        }
    }
}
