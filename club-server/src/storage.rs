//! redb-based storage layer for sessions, catalog documents, and the ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sessions` | `table_id` | `SessionSnapshot` | One active session per table |
//! | `club_tables` | `table_id` | `ClubTable` | Table catalog |
//! | `menu_items` | `item_id` | `MenuItem` | Snack/drink catalog with stock |
//! | `members` | `member_id` | `Member` | Membership hours ledger |
//! | `membership_plans` | `plan_id` | `MembershipPlan` | Plan catalog |
//! | `transactions` | `transaction_id` | `SettledTransaction` | Append-only settlement ledger |
//!
//! All values are JSON-serialized. Everything settlement touches lives in
//! this one database so a single write transaction covers the whole
//! commit: transaction record, stock decrements, hours deduction, and
//! session deletion either all land or none do.
//!
//! # Concurrency
//!
//! redb allows one write transaction at a time, which serializes every
//! mutation. On top of that, session writes are version-checked: a writer
//! must present the version it read, and a mismatch is rejected so a stale
//! terminal cannot clobber a newer record.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{ClubTable, Member, MembershipPlan, MenuItem, SettledTransaction};
use shared::session::SessionSnapshot;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Active sessions: key = table_id, value = JSON-serialized SessionSnapshot
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Table catalog: key = table_id, value = JSON-serialized ClubTable
const CLUB_TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("club_tables");

/// Menu catalog: key = item_id, value = JSON-serialized MenuItem
const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");

/// Members: key = member_id, value = JSON-serialized Member
const MEMBERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("members");

/// Membership plans: key = plan_id, value = JSON-serialized MembershipPlan
const PLANS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("membership_plans");

/// Settlement ledger: key = transaction_id, value = JSON-serialized SettledTransaction
const TRANSACTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

const ALL_TABLES: [TableDefinition<&str, &[u8]>; 6] = [
    SESSIONS_TABLE,
    CLUB_TABLES_TABLE,
    MENU_ITEMS_TABLE,
    MEMBERS_TABLE,
    PLANS_TABLE,
    TRANSACTIONS_TABLE,
];

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No session stored for table: {0}")]
    SessionNotFound(String),

    #[error("Stale session write for table {table_id}: stored version {stored}, got {presented}")]
    VersionConflict {
        table_id: String,
        stored: u64,
        presented: u64,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Club storage backed by redb
///
/// Commits are durable as soon as `commit()` returns; the database file is
/// copy-on-write and stays consistent across power loss.
#[derive(Clone)]
pub struct ClubStorage {
    db: Arc<Database>,
}

impl ClubStorage {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Create all tables up front so read transactions never hit a
        // missing table.
        let write_txn = db.begin_write()?;
        {
            for def in ALL_TABLES {
                let _ = write_txn.open_table(def)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            for def in ALL_TABLES {
                let _ = write_txn.open_table(def)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction.
    ///
    /// redb allows a single writer; this call blocks while another write
    /// transaction is open.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Generic JSON document access ==========

    fn read_doc<T: DeserializeOwned>(
        &self,
        def: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(def)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn read_doc_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        def: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(def)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    fn read_all<T: DeserializeOwned>(
        &self,
        def: TableDefinition<&'static str, &'static [u8]>,
    ) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(def)?;
        let mut docs = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            docs.push(serde_json::from_slice(value.value())?);
        }
        Ok(docs)
    }

    fn write_doc<T: Serialize>(
        &self,
        txn: &WriteTransaction,
        def: TableDefinition<&'static str, &'static [u8]>,
        key: &str,
        doc: &T,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(doc)?;
        let mut table = txn.open_table(def)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    // ========== Sessions ==========

    /// Get the active session for a table, if any.
    pub fn get_session(&self, table_id: &str) -> StorageResult<Option<SessionSnapshot>> {
        self.read_doc(SESSIONS_TABLE, table_id)
    }

    /// Get the active session within a write transaction.
    pub fn get_session_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<SessionSnapshot>> {
        self.read_doc_txn(txn, SESSIONS_TABLE, table_id)
    }

    /// Store a session, enforcing the optimistic version check.
    ///
    /// The caller presents the snapshot with the version it read (0 for a
    /// brand-new session). On success the stored record carries
    /// `version + 1`, reflected back into `session`.
    pub fn store_session(
        &self,
        txn: &WriteTransaction,
        session: &mut SessionSnapshot,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SESSIONS_TABLE)?;

        let stored_version = {
            match table.get(session.table_id.as_str())? {
                Some(guard) => {
                    let existing: SessionSnapshot = serde_json::from_slice(guard.value())?;
                    Some(existing.version)
                }
                None => None,
            }
        };

        match stored_version {
            Some(stored) if stored != session.version => {
                return Err(StorageError::VersionConflict {
                    table_id: session.table_id.clone(),
                    stored,
                    presented: session.version,
                });
            }
            None if session.version != 0 => {
                // Session vanished under the writer (settled elsewhere)
                return Err(StorageError::SessionNotFound(session.table_id.clone()));
            }
            _ => {}
        }

        session.version += 1;
        let bytes = serde_json::to_vec(session)?;
        table.insert(session.table_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    /// Delete the session for a table. Returns whether a record existed.
    pub fn delete_session(&self, txn: &WriteTransaction, table_id: &str) -> StorageResult<bool> {
        let mut table = txn.open_table(SESSIONS_TABLE)?;
        Ok(table.remove(table_id)?.is_some())
    }

    /// All currently stored sessions.
    pub fn list_sessions(&self) -> StorageResult<Vec<SessionSnapshot>> {
        self.read_all(SESSIONS_TABLE)
    }

    // ========== Table catalog ==========

    pub fn get_table(&self, table_id: &str) -> StorageResult<Option<ClubTable>> {
        self.read_doc(CLUB_TABLES_TABLE, table_id)
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<ClubTable>> {
        self.read_doc_txn(txn, CLUB_TABLES_TABLE, table_id)
    }

    pub fn store_table(&self, txn: &WriteTransaction, table: &ClubTable) -> StorageResult<()> {
        self.write_doc(txn, CLUB_TABLES_TABLE, &table.id, table)
    }

    pub fn list_tables(&self) -> StorageResult<Vec<ClubTable>> {
        self.read_all(CLUB_TABLES_TABLE)
    }

    // ========== Menu catalog ==========

    pub fn get_menu_item(&self, item_id: &str) -> StorageResult<Option<MenuItem>> {
        self.read_doc(MENU_ITEMS_TABLE, item_id)
    }

    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        item_id: &str,
    ) -> StorageResult<Option<MenuItem>> {
        self.read_doc_txn(txn, MENU_ITEMS_TABLE, item_id)
    }

    pub fn store_menu_item(&self, txn: &WriteTransaction, item: &MenuItem) -> StorageResult<()> {
        self.write_doc(txn, MENU_ITEMS_TABLE, &item.id, item)
    }

    pub fn list_menu_items(&self) -> StorageResult<Vec<MenuItem>> {
        self.read_all(MENU_ITEMS_TABLE)
    }

    // ========== Members and plans ==========

    pub fn get_member(&self, member_id: &str) -> StorageResult<Option<Member>> {
        self.read_doc(MEMBERS_TABLE, member_id)
    }

    pub fn get_member_txn(
        &self,
        txn: &WriteTransaction,
        member_id: &str,
    ) -> StorageResult<Option<Member>> {
        self.read_doc_txn(txn, MEMBERS_TABLE, member_id)
    }

    pub fn store_member(&self, txn: &WriteTransaction, member: &Member) -> StorageResult<()> {
        self.write_doc(txn, MEMBERS_TABLE, &member.id, member)
    }

    pub fn list_members(&self) -> StorageResult<Vec<Member>> {
        self.read_all(MEMBERS_TABLE)
    }

    pub fn get_plan(&self, plan_id: &str) -> StorageResult<Option<MembershipPlan>> {
        self.read_doc(PLANS_TABLE, plan_id)
    }

    pub fn store_plan(&self, txn: &WriteTransaction, plan: &MembershipPlan) -> StorageResult<()> {
        self.write_doc(txn, PLANS_TABLE, &plan.id, plan)
    }

    // ========== Settlement ledger ==========

    /// Append a settled transaction. Records are never updated afterwards.
    pub fn store_transaction(
        &self,
        txn: &WriteTransaction,
        record: &SettledTransaction,
    ) -> StorageResult<()> {
        self.write_doc(txn, TRANSACTIONS_TABLE, &record.id, record)
    }

    pub fn get_transaction(&self, id: &str) -> StorageResult<Option<SettledTransaction>> {
        self.read_doc(TRANSACTIONS_TABLE, id)
    }

    /// All settled transactions, oldest first.
    pub fn list_transactions(&self) -> StorageResult<Vec<SettledTransaction>> {
        let mut records: Vec<SettledTransaction> = self.read_all(TRANSACTIONS_TABLE)?;
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
