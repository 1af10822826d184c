//! Shared types for the club engine
//!
//! Data model used across crates: catalog entities (tables, menu items,
//! members, plans), the active table session, the settled transaction
//! ledger record, and the notification events emitted by the session
//! manager.

pub mod models;
pub mod session;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
