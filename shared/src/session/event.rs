//! Session events: notifications emitted after a mutation is persisted
//!
//! In-process watchers (table grids, the display ticker's subscribers)
//! consume these over a broadcast channel. They are notifications, not an
//! event-sourced log: the persisted snapshot is the source of truth.

use serde::{Deserialize, Serialize};

/// Notification emitted by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    SessionStarted {
        table_id: String,
        start_time: i64,
    },
    SessionPaused {
        table_id: String,
        elapsed_seconds: i64,
    },
    SessionResumed {
        table_id: String,
    },
    SessionStopped {
        table_id: String,
        elapsed_seconds: i64,
    },
    ItemAdded {
        table_id: String,
        item_id: String,
        /// Line quantity after the add
        quantity: i32,
    },
    ItemRemoved {
        table_id: String,
        item_id: String,
    },
    MemberAttached {
        table_id: String,
        member_id: String,
    },
    MemberDetached {
        table_id: String,
    },
    SessionSettled {
        table_id: String,
        transaction_id: String,
        total_amount: f64,
    },
    /// Display-only elapsed time for a running session; never persisted
    Tick {
        table_id: String,
        elapsed_seconds: i64,
    },
}
