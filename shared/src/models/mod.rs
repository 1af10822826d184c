//! Data models
//!
//! Catalog and ledger documents. All IDs are string document ids.

pub mod club_table;
pub mod member;
pub mod menu_item;
pub mod transaction;

// Re-exports
pub use club_table::*;
pub use member::*;
pub use menu_item::*;
pub use transaction::*;
