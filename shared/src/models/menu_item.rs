//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Orderable snack or drink with its current stock level.
///
/// Stock is a plain counter. Settlement may drive it negative when sales
/// outpace restock bookkeeping; that is logged as a warning, never treated
/// as an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Unit price (non-negative)
    pub price: f64,
    pub stock: i32,
}
