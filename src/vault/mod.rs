//! Passphrase-protected storage of the planning document.
//!
//! - [`session`]: the synchronous lifecycle state machine.
//! - [`handle`]: the shareable async [`Vault`] with auto-lock.
//! - [`legacy`]: one-shot import of pre-encryption data.
//! - [`store`]: typed reads and writes of the stored entries.

mod config;
mod error;
pub mod handle;
pub mod legacy;
pub mod session;
pub mod store;

pub use config::*;
pub use error::VaultError;
pub use handle::{ActivityKind, Vault};
pub use legacy::MigrationOutcome;
pub use session::{LockState, VaultSession};
pub use store::StoredPayload;
