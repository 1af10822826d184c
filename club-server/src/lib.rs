//! Table session & billing engine for a cue-sports club
//!
//! Tracks in-progress table rentals (start/pause/resume/stop), accumulates
//! time-based and item-based charges, and settles each session into an
//! append-only transaction ledger while decrementing snack stock and, for
//! membership settlements, the member's hours balance.
//!
//! # Architecture
//!
//! ```text
//! Caller → SessionManager → machine transition → ClubStorage (redb)
//!               ↓                                      ↓
//!           Broadcast                           full snapshot write
//!               ↓                               (version-checked)
//!        All subscribers
//!
//! Settle → SettlementCoordinator → one write transaction:
//!            transaction record + stock decrements
//!            (+ member hours deduction) + session deletion
//! ```
//!
//! The engine is a library: request-handling code outside this crate drives
//! it. There is no HTTP surface here.

pub mod billing;
pub mod catalog;
pub mod config;
pub mod sessions;
pub mod settlement;
pub mod storage;
pub mod utils;

// Re-exports
pub use catalog::{CatalogError, CatalogService};
pub use config::Config;
pub use sessions::{SessionError, SessionManager, SessionTicker};
pub use settlement::{SettlementCoordinator, SettlementError};
pub use storage::{ClubStorage, StorageError};
