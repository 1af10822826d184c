use crate::storage::StorageError;
use shared::session::SessionStatus;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Membership expired for member: {0}")]
    MembershipExpired(String),

    #[error("Table {table_id} already has a {status} session")]
    TableOccupied {
        table_id: String,
        status: SessionStatus,
    },

    #[error("No active session for table: {0}")]
    NoSession(String),

    #[error("Cannot {op} a {from} session")]
    InvalidTransition {
        op: &'static str,
        from: SessionStatus,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;
