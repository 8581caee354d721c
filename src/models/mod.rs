//! Domain models for ShadowBoard.
//!
//! # Core Concepts
//!
//! ## Protected Document
//!
//! - [`AppState`]: The whole document kept in the vault. Always carries all
//!   three collections, each possibly empty.
//! - [`Mission`]: A long-horizon objective with [`Phase`]s and [`StrategicMove`]s.
//! - [`RiskPoint`]: A probability/impact pair; exposure is derived.
//! - [`MomentumLog`]: One score per week, upserted by week key.
//!
//! ## Storage Records
//!
//! - [`VaultPayload`]: The encrypted-at-rest record.
//! - [`Theme`]: Unencrypted display preference.
//!
//! Documents read from storage go through [`normalize`] before anything else
//! sees them.

mod mission;
mod momentum;
mod normalize;
mod payload;
mod risk;
mod state;
mod summary;
mod theme;

pub use mission::*;
pub use momentum::*;
pub use normalize::*;
pub use payload::*;
pub use risk::*;
pub use state::*;
pub use summary::*;
pub use theme::*;
