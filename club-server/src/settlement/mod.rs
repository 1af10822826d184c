//! Settlement coordinator
//!
//! Validates the chosen payment against the frozen session and commits the
//! whole settlement as one storage transaction:
//!
//! ```text
//! settle(table_id, payment)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load session (must exist and be STOPPED)
//!     ├─ 3. Load table snapshot
//!     ├─ 4. Compute bill, validate payment constraints
//!     ├─ 5. Append immutable transaction record
//!     ├─ 6. Decrement stock per order line (negative allowed, warned)
//!     ├─ 7. Deduct member hours (membership settlements)
//!     ├─ 8. Delete the session, making the table available
//!     └─ 9. Commit; any earlier error drops the txn, leaving no effect
//! ```
//!
//! Failures surface synchronously; nothing here retries. Retrying a failed
//! settlement is an operator decision.

use crate::billing;
use crate::storage::{ClubStorage, StorageError};
use rust_decimal::Decimal;
use shared::models::SettledTransaction;
use shared::session::{PaymentInput, SessionStatus};
use thiserror::Error;

/// Settlement errors
///
/// Variants are distinct so the caller can render an accurate message:
/// validation rejections, not-found aborts, and storage failures are
/// different conversations with the operator.
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No active session for table: {0}")]
    NoSession(String),

    #[error("Session for table {table_id} is {status}; stop the timer before settling")]
    SessionNotStopped {
        table_id: String,
        status: SessionStatus,
    },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Menu item not found at settlement: {0}")]
    ItemNotFound(String),

    #[error("Order line '{0}' has no catalog id")]
    MalformedLine(String),

    #[error("Split amounts must be finite and non-negative")]
    InvalidSplitAmount,

    #[error("Split total mismatch: cash {cash_amount} + UPI {upi_amount} does not cover payable {total_payable}")]
    SplitMismatch {
        total_payable: f64,
        cash_amount: f64,
        upi_amount: f64,
    },

    #[error("No member attached to the session for table: {0}")]
    NoMemberAttached(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Member {member_id} has {remaining} hours left, session needs {required}")]
    InsufficientHours {
        member_id: String,
        required: f64,
        remaining: f64,
    },
}

pub type SettleResult<T> = Result<T, SettlementError>;

/// Coordinates the atomic settlement of a stopped session.
pub struct SettlementCoordinator<'a> {
    storage: &'a ClubStorage,
}

impl<'a> SettlementCoordinator<'a> {
    pub fn new(storage: &'a ClubStorage) -> Self {
        Self { storage }
    }

    /// Validate and commit the settlement, returning the ledger record.
    pub fn settle(
        &self,
        table_id: &str,
        payment: &PaymentInput,
    ) -> SettleResult<SettledTransaction> {
        let now = shared::util::now_millis();

        // 1. Single transaction for the whole commit
        let txn = self.storage.begin_write()?;

        // 2. Session must exist and be frozen
        let session = self
            .storage
            .get_session_txn(&txn, table_id)?
            .ok_or_else(|| SettlementError::NoSession(table_id.to_string()))?;
        if session.status != SessionStatus::Stopped {
            return Err(SettlementError::SessionNotStopped {
                table_id: table_id.to_string(),
                status: session.status,
            });
        }

        // 3. Table snapshot for the rate and the record
        let table = self
            .storage
            .get_table_txn(&txn, table_id)?
            .ok_or_else(|| SettlementError::TableNotFound(table_id.to_string()))?;

        // 4. Bill and method constraints; all rejections happen before
        //    any write below
        for line in &session.items {
            if line.item_id.is_empty() {
                return Err(SettlementError::MalformedLine(line.name.clone()));
            }
        }

        let bill = billing::compute_bill(&session, &table, payment);
        let played = billing::played_hours(session.elapsed_seconds);

        let mut cash_amount = None;
        let mut upi_amount = None;
        let mut member = None;
        match payment {
            PaymentInput::Split {
                cash_amount: cash,
                upi_amount: upi,
            } => {
                if !cash.is_finite() || !upi.is_finite() || *cash < 0.0 || *upi < 0.0 {
                    return Err(SettlementError::InvalidSplitAmount);
                }
                if !billing::split_covers_total(*cash, *upi, bill.total_payable) {
                    return Err(SettlementError::SplitMismatch {
                        total_payable: bill.total_payable,
                        cash_amount: *cash,
                        upi_amount: *upi,
                    });
                }
                cash_amount = Some(*cash);
                upi_amount = Some(*upi);
            }
            PaymentInput::Membership => {
                let member_id = session
                    .member_id
                    .as_deref()
                    .ok_or_else(|| SettlementError::NoMemberAttached(table_id.to_string()))?;
                let record = self
                    .storage
                    .get_member_txn(&txn, member_id)?
                    .ok_or_else(|| SettlementError::MemberNotFound(member_id.to_string()))?;
                if billing::rounded_hours(record.remaining_hours) < played {
                    return Err(SettlementError::InsufficientHours {
                        member_id: member_id.to_string(),
                        required: billing::to_f64(played),
                        remaining: record.remaining_hours,
                    });
                }
                member = Some(record);
            }
            PaymentInput::Cash | PaymentInput::Upi | PaymentInput::Card => {}
        }

        // 5. Immutable ledger record
        let record = SettledTransaction {
            id: shared::util::new_doc_id(),
            table_id: table.id.clone(),
            table_name: table.name.clone(),
            start_time: session.start_time,
            end_time: now,
            duration_seconds: session.elapsed_seconds,
            table_cost: bill.table_cost,
            items_cost: bill.items_cost,
            total_amount: bill.total_payable,
            payment_method: payment.method(),
            cash_amount,
            upi_amount,
            items: session.items.clone(),
            customer_name: session.customer_name.clone(),
            created_at: now,
        };
        self.storage.store_transaction(&txn, &record)?;

        // 6. Stock decrements; an unknown item aborts the whole commit
        for line in &session.items {
            let mut item = self
                .storage
                .get_menu_item_txn(&txn, &line.item_id)?
                .ok_or_else(|| SettlementError::ItemNotFound(line.item_id.clone()))?;
            item.stock -= line.quantity;
            if item.stock < 0 {
                tracing::warn!(
                    item_id = %item.id,
                    item_name = %item.name,
                    stock = item.stock,
                    "Stock went negative at settlement"
                );
            }
            self.storage.store_menu_item(&txn, &item)?;
        }

        // 7. Membership hours deduction, 4-decimal rounded
        if let Some(mut member) = member {
            let remaining =
                (billing::to_decimal(member.remaining_hours) - played).round_dp(4);
            member.remaining_hours = billing::to_f64(remaining.max(Decimal::ZERO));
            self.storage.store_member(&txn, &member)?;
            tracing::info!(
                member_id = %member.id,
                hours_deducted = billing::to_f64(played),
                remaining_hours = member.remaining_hours,
                "Member hours deducted"
            );
        }

        // 8. The table becomes available again
        self.storage.delete_session(&txn, table_id)?;

        // 9. All-or-nothing
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            table_id,
            transaction_id = %record.id,
            total_amount = record.total_amount,
            payment_method = ?record.payment_method,
            "Session settled"
        );
        Ok(record)
    }
}
