//! Table session module
//!
//! Tracks the rental lifecycle of every club table:
//!
//! - **machine**: the pure state transitions (start / pause / resume /
//!   stop / item and member mutations). Each takes the full prior snapshot
//!   and returns the full next one, with no partial merges.
//! - **manager**: loads the snapshot, applies a transition, and persists
//!   the result inside a single storage transaction, then broadcasts a
//!   [`shared::session::SessionEvent`].
//! - **ticker**: the display-only elapsed-time broadcaster for running
//!   sessions.
//!
//! # Mutation Flow
//!
//! ```text
//! manager call
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load current snapshot (and catalog docs the transition needs)
//!     ├─ 3. Apply machine transition → next snapshot
//!     ├─ 4. Version-checked store
//!     ├─ 5. Commit
//!     └─ 6. Broadcast event
//! ```

pub mod error;
pub mod machine;
pub mod manager;
pub mod ticker;

// Re-exports
pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
pub use ticker::SessionTicker;
