//! Billing calculator
//!
//! Pure money math over a frozen session using `rust_decimal`. Values are
//! `f64` at the storage boundary and `Decimal` everywhere costs are
//! computed. Intermediate costs keep full precision; only the final
//! payable amount is floored to the currency unit.

use rust_decimal::prelude::*;
use shared::models::ClubTable;
use shared::session::{OrderLine, PaymentInput, SessionSnapshot};

/// Decimal places for played-hours rounding, absorbing float drift in
/// membership balances.
const HOURS_DECIMAL_PLACES: u32 = 4;

const SECONDS_PER_HOUR: i64 = 3600;

/// Convert an f64 storage value to Decimal for computation.
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a computed Decimal back to an f64 storage value.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Computed charges for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct BillBreakdown {
    /// Time charge at full precision
    pub table_cost: f64,
    /// Item charge at full precision
    pub items_cost: f64,
    /// Final payable amount, floored to the currency unit
    pub total_payable: f64,
}

/// Time charge: hours of play times the table's hourly rate.
pub fn table_cost(elapsed_seconds: i64, hourly_rate: f64) -> Decimal {
    Decimal::from(elapsed_seconds) * to_decimal(hourly_rate) / Decimal::from(SECONDS_PER_HOUR)
}

/// Item charge: sum of unit price times quantity over all lines.
pub fn items_cost(items: &[OrderLine]) -> Decimal {
    items
        .iter()
        .map(|line| to_decimal(line.price) * Decimal::from(line.quantity))
        .sum()
}

/// Compute the bill for a frozen session.
///
/// A membership settlement covers table time from the member's hours
/// balance, so only the items are payable in money.
pub fn compute_bill(
    session: &SessionSnapshot,
    table: &ClubTable,
    payment: &PaymentInput,
) -> BillBreakdown {
    let time_charge = table_cost(session.elapsed_seconds, table.hourly_rate);
    let item_charge = items_cost(&session.items);

    let total = match payment {
        PaymentInput::Membership => item_charge.floor(),
        _ => (time_charge + item_charge).floor(),
    };

    BillBreakdown {
        table_cost: to_f64(time_charge),
        items_cost: to_f64(item_charge),
        total_payable: to_f64(total),
    }
}

/// Hours of play for membership accounting, rounded to 4 decimals.
pub fn played_hours(elapsed_seconds: i64) -> Decimal {
    (Decimal::from(elapsed_seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp(HOURS_DECIMAL_PLACES)
}

/// A member's balance rounded the same way played hours are.
pub fn rounded_hours(hours: f64) -> Decimal {
    to_decimal(hours).round_dp(HOURS_DECIMAL_PLACES)
}

/// Whether the two halves of a split cover the total exactly: the floor of
/// their sum must equal the payable amount.
pub fn split_covers_total(cash_amount: f64, upi_amount: f64, total_payable: f64) -> bool {
    (to_decimal(cash_amount) + to_decimal(upi_amount)).floor() == to_decimal(total_payable)
}
