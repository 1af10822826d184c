//! Club Table Model

use serde::{Deserialize, Serialize};

/// Table category determines which rental pricing group a table belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableCategory {
    AmericanPool,
    MiniSnooker,
    Standard,
}

/// Club table entity
///
/// Read-only input to session tracking and billing; the rate in force when
/// a session is settled is the rate charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClubTable {
    pub id: String,
    pub name: String,
    pub category: TableCategory,
    /// Rental rate per hour of play (non-negative)
    pub hourly_rate: f64,
}
