//! Settled transaction record

use crate::session::{OrderLine, PaymentMethod};
use serde::{Deserialize, Serialize};

/// Immutable record written exactly once when a table session is settled.
///
/// Forms the append-only ledger the reporting views read. Never updated
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettledTransaction {
    pub id: String,
    pub table_id: String,
    pub table_name: String,
    /// Timer base instant of the settled session (Unix millis)
    pub start_time: i64,
    /// Settlement instant (Unix millis)
    pub end_time: i64,
    /// Frozen play time of the session
    pub duration_seconds: i64,
    /// Table time cost at full precision
    pub table_cost: f64,
    /// Items cost at full precision
    pub items_cost: f64,
    /// Final charged amount, floored to the currency unit
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    /// Cash half of a split settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_amount: Option<f64>,
    /// UPI half of a split settlement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_amount: Option<f64>,
    /// Item lines sold with the session
    pub items: Vec<OrderLine>,
    pub customer_name: String,
    pub created_at: i64,
}
