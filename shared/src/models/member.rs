//! Member and membership plan models

use serde::{Deserialize, Serialize};

/// Membership plan: a purchasable block of table hours.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipPlan {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    /// Hours of table time the plan grants on enrollment
    pub total_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Member entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub plan_id: String,
    /// Hours left on the plan; only settlement deducts from this
    pub remaining_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    /// Expiry timestamp (Unix millis); absent = never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_date: Option<i64>,
}

impl Member {
    /// Whether the membership has expired as of `now_ms`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.validity_date.is_some_and(|v| v < now_ms)
    }
}

/// Create member payload
///
/// `remaining_hours` is not part of the payload: enrollment seeds it from
/// the selected plan's `total_hours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberCreate {
    pub name: String,
    pub plan_id: String,
    pub mobile_number: Option<String>,
    pub validity_date: Option<i64>,
}
