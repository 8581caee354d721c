//! ShadowBoard: an encrypted local vault with undo history for a personal
//! planning dashboard.

pub mod api;
pub mod client;
pub mod crypto;
pub mod db;
pub mod history;
pub mod models;
pub mod vault;
