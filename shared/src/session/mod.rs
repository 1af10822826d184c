//! Table session types
//!
//! - **types**: statuses, order lines, payment selection, table state
//! - **snapshot**: the persisted per-table session record
//! - **event**: notifications emitted by the session manager

pub mod event;
pub mod snapshot;
pub mod types;

// Re-exports
pub use event::SessionEvent;
pub use snapshot::{SessionSnapshot, WALK_IN_CUSTOMER};
pub use types::{OrderLine, PaymentInput, PaymentMethod, SessionStatus, TableState};
