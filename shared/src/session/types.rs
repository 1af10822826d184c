//! Shared types for table sessions

use crate::models::MenuItem;
use serde::{Deserialize, Serialize};

// ============================================================================
// Session Status
// ============================================================================

/// Stored session status.
///
/// `Idle` is a session that holds pre-seeded order lines but whose timer
/// has never started. A table with no session record at all is `Available`
/// (see [`TableState`]); absence is not encoded as a status value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "IDLE"),
            SessionStatus::Running => write!(f, "RUNNING"),
            SessionStatus::Paused => write!(f, "PAUSED"),
            SessionStatus::Stopped => write!(f, "STOPPED"),
        }
    }
}

// ============================================================================
// Order Lines
// ============================================================================

/// Order line: a menu item snapshot plus quantity.
///
/// Price and name are captured at add time so later catalog edits do not
/// change what an open session will be billed. Quantity is always >= 1;
/// a line decremented to zero is removed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Catalog id of the menu item
    pub item_id: String,
    pub name: String,
    pub category: String,
    /// Unit price captured at add time
    pub price: f64,
    pub quantity: i32,
}

impl OrderLine {
    /// Snapshot a catalog item as a quantity-1 line.
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.price,
            quantity: 1,
        }
    }
}

// ============================================================================
// Payment
// ============================================================================

/// Payment method tag recorded on the transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Split,
    Membership,
}

/// Payment chosen at settlement time.
///
/// Split carries the two halves entered by staff; membership carries no
/// amount, since the hours balance of the attached member covers table time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentInput {
    Cash,
    Upi,
    Card,
    Split { cash_amount: f64, upi_amount: f64 },
    Membership,
}

impl PaymentInput {
    /// The method tag for the transaction record.
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInput::Cash => PaymentMethod::Cash,
            PaymentInput::Upi => PaymentMethod::Upi,
            PaymentInput::Card => PaymentMethod::Card,
            PaymentInput::Split { .. } => PaymentMethod::Split,
            PaymentInput::Membership => PaymentMethod::Membership,
        }
    }
}

// ============================================================================
// Table State
// ============================================================================

/// Tagged answer to "what is this table doing right now".
///
/// Returned by the query side so callers never null-check a missing
/// session record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableState {
    Available,
    Occupied {
        session: Box<crate::session::SessionSnapshot>,
    },
}

impl TableState {
    pub fn is_available(&self) -> bool {
        matches!(self, TableState::Available)
    }
}
