//! Active session snapshot: the per-table rental record
//!
//! One record per occupied table, keyed by table id. Elapsed play time is
//! authoritative in `elapsed_seconds` whenever the timer is not running;
//! while running it is derived on demand from `start_time` and
//! `total_pause_duration`, so a crashed or torn-down display never loses
//! time.

use super::types::{OrderLine, SessionStatus};
use serde::{Deserialize, Serialize};

/// Customer label used until a member is attached.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Active session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    /// Table this session occupies (also the storage key)
    pub table_id: String,
    /// Table name captured at creation, for display and the final record
    pub table_name: String,
    pub status: SessionStatus,
    /// Timer base instant (Unix millis); rebased when a stopped session
    /// resumes
    pub start_time: i64,
    /// Accumulated play time in seconds, frozen whenever the status leaves
    /// RUNNING
    pub elapsed_seconds: i64,
    /// Cumulative seconds spent paused since `start_time`
    pub total_pause_duration: i64,
    /// Instant the current pause began; present only while PAUSED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_time: Option<i64>,
    pub items: Vec<OrderLine>,
    pub customer_name: String,
    /// Attached member, set by the membership search-and-select step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Write token; bumped on every persisted mutation. A writer holding a
    /// stale version is rejected.
    pub version: u64,
}

impl SessionSnapshot {
    /// Create an IDLE session holding no items yet.
    ///
    /// Used when staff pre-seed order lines before starting the timer.
    pub fn idle(table_id: impl Into<String>, table_name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            table_id: table_id.into(),
            table_name: table_name.into(),
            status: SessionStatus::Idle,
            start_time: now_ms,
            elapsed_seconds: 0,
            total_pause_duration: 0,
            pause_time: None,
            items: Vec::new(),
            customer_name: WALK_IN_CUSTOMER.to_string(),
            member_id: None,
            created_at: now_ms,
            updated_at: now_ms,
            version: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Play time in seconds as of `now_ms`.
    ///
    /// While RUNNING this is wall clock minus accumulated pauses; in every
    /// other status it is the frozen `elapsed_seconds`.
    pub fn elapsed_at(&self, now_ms: i64) -> i64 {
        match self.status {
            SessionStatus::Running => {
                (now_ms - self.start_time) / 1000 - self.total_pause_duration
            }
            _ => self.elapsed_seconds,
        }
    }

    /// Find the order line for a catalog item, if present.
    pub fn line(&self, item_id: &str) -> Option<&OrderLine> {
        self.items.iter().find(|l| l.item_id == item_id)
    }
}
