//! SessionManager: loads, transitions, persists, broadcasts
//!
//! Every mutation runs as load → machine transition → version-checked
//! store inside a single write transaction, so concurrent terminals can
//! never interleave partial updates on the same table. Events are
//! broadcast only after the commit succeeds.

use crate::sessions::error::{SessionError, SessionResult};
use crate::sessions::machine;
use crate::settlement::{SettleResult, SettlementCoordinator};
use crate::storage::{ClubStorage, StorageError};
use shared::models::SettledTransaction;
use shared::session::{PaymentInput, SessionEvent, SessionSnapshot, TableState};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Session manager for a single club storage.
pub struct SessionManager {
    storage: ClubStorage,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("storage", &"<ClubStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl SessionManager {
    pub fn new(storage: ClubStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { storage, event_tx }
    }

    /// Subscribe to session event broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage.
    pub fn storage(&self) -> &ClubStorage {
        &self.storage
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No active event subscribers");
        }
    }

    // ========== Timer transitions ==========

    /// Start play on a table. Fails if the table is unknown or already has
    /// a non-IDLE session.
    pub fn start_session(&self, table_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let table = self
            .storage
            .get_table_txn(&txn, table_id)?
            .ok_or_else(|| SessionError::TableNotFound(table_id.to_string()))?;
        let existing = self.storage.get_session_txn(&txn, table_id)?;

        let mut session = machine::start(existing, &table, now)?;
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, "Session started");
        self.emit(SessionEvent::SessionStarted {
            table_id: table_id.to_string(),
            start_time: session.start_time,
        });
        Ok(session)
    }

    /// Pause a running session.
    pub fn pause_session(&self, table_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::pause(existing, now)?;
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            table_id,
            elapsed_seconds = session.elapsed_seconds,
            "Session paused"
        );
        self.emit(SessionEvent::SessionPaused {
            table_id: table_id.to_string(),
            elapsed_seconds: session.elapsed_seconds,
        });
        Ok(session)
    }

    /// Resume a paused or stopped session.
    pub fn resume_session(&self, table_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::resume(existing, now)?;
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, "Session resumed");
        self.emit(SessionEvent::SessionResumed {
            table_id: table_id.to_string(),
        });
        Ok(session)
    }

    /// Stop the timer, freezing elapsed time for billing.
    pub fn stop_session(&self, table_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::stop(existing, now)?;
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            table_id,
            elapsed_seconds = session.elapsed_seconds,
            "Session stopped"
        );
        self.emit(SessionEvent::SessionStopped {
            table_id: table_id.to_string(),
            elapsed_seconds: session.elapsed_seconds,
        });
        Ok(session)
    }

    // ========== Order lines ==========

    /// Add one unit of a catalog item to the table's session, creating an
    /// IDLE session when the table has none.
    pub fn add_item(&self, table_id: &str, item_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let table = self
            .storage
            .get_table_txn(&txn, table_id)?
            .ok_or_else(|| SessionError::TableNotFound(table_id.to_string()))?;
        let item = self
            .storage
            .get_menu_item_txn(&txn, item_id)?
            .ok_or_else(|| SessionError::MenuItemNotFound(item_id.to_string()))?;
        let existing = self.storage.get_session_txn(&txn, table_id)?;

        let mut session = machine::add_item(existing, &table, &item, now);
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        let quantity = session.line(item_id).map(|l| l.quantity).unwrap_or(0);
        tracing::debug!(table_id, item_id, quantity, "Item added");
        self.emit(SessionEvent::ItemAdded {
            table_id: table_id.to_string(),
            item_id: item_id.to_string(),
            quantity,
        });
        Ok(session)
    }

    /// Remove one unit of a catalog item; a no-op when the item is not on
    /// the session.
    pub fn remove_item(&self, table_id: &str, item_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::remove_item(existing, item_id, now);
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(table_id, item_id, "Item removed");
        self.emit(SessionEvent::ItemRemoved {
            table_id: table_id.to_string(),
            item_id: item_id.to_string(),
        });
        Ok(session)
    }

    // ========== Membership ==========

    /// Attach a member to the session (after a search-and-select step).
    /// Rejects unknown members and expired memberships.
    pub fn attach_member(&self, table_id: &str, member_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let member = self
            .storage
            .get_member_txn(&txn, member_id)?
            .ok_or_else(|| SessionError::MemberNotFound(member_id.to_string()))?;
        if member.is_expired(now) {
            return Err(SessionError::MembershipExpired(member_id.to_string()));
        }

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::attach_member(existing, &member, now);
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, member_id, "Member attached");
        self.emit(SessionEvent::MemberAttached {
            table_id: table_id.to_string(),
            member_id: member_id.to_string(),
        });
        Ok(session)
    }

    /// Detach the member, restoring the walk-in customer label.
    pub fn detach_member(&self, table_id: &str) -> SessionResult<SessionSnapshot> {
        let now = shared::util::now_millis();
        let txn = self.storage.begin_write()?;

        let existing = self.require_session(&txn, table_id)?;
        let mut session = machine::detach_member(existing, now);
        self.storage.store_session(&txn, &mut session)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, "Member detached");
        self.emit(SessionEvent::MemberDetached {
            table_id: table_id.to_string(),
        });
        Ok(session)
    }

    // ========== Settlement ==========

    /// Settle the table's stopped session.
    ///
    /// Validation and the atomic commit live in the settlement module;
    /// on success the session record is gone and the table is available.
    pub fn settle(&self, table_id: &str, payment: &PaymentInput) -> SettleResult<SettledTransaction> {
        let record = SettlementCoordinator::new(&self.storage).settle(table_id, payment)?;
        self.emit(SessionEvent::SessionSettled {
            table_id: table_id.to_string(),
            transaction_id: record.id.clone(),
            total_amount: record.total_amount,
        });
        Ok(record)
    }

    // ========== Queries ==========

    /// What a table is doing right now.
    pub fn table_state(&self, table_id: &str) -> SessionResult<TableState> {
        Ok(match self.storage.get_session(table_id)? {
            Some(session) => TableState::Occupied {
                session: Box::new(session),
            },
            None => TableState::Available,
        })
    }

    /// All stored sessions (any status).
    pub fn active_sessions(&self) -> SessionResult<Vec<SessionSnapshot>> {
        Ok(self.storage.list_sessions()?)
    }

    fn require_session(
        &self,
        txn: &redb::WriteTransaction,
        table_id: &str,
    ) -> SessionResult<SessionSnapshot> {
        self.storage
            .get_session_txn(txn, table_id)?
            .ok_or_else(|| SessionError::NoSession(table_id.to_string()))
    }
}

// Make SessionManager Clone-able (storage and sender are both handles)
impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ClubTable, Member, MenuItem, TableCategory};
    use shared::session::SessionStatus;

    fn create_test_manager() -> SessionManager {
        let storage = ClubStorage::open_in_memory().unwrap();

        let txn = storage.begin_write().unwrap();
        storage
            .store_table(
                &txn,
                &ClubTable {
                    id: "table-1".to_string(),
                    name: "Table 1".to_string(),
                    category: TableCategory::AmericanPool,
                    hourly_rate: 120.0,
                },
            )
            .unwrap();
        storage
            .store_menu_item(
                &txn,
                &MenuItem {
                    id: "item-1".to_string(),
                    name: "Chips".to_string(),
                    category: "Snacks".to_string(),
                    price: 30.0,
                    stock: 10,
                },
            )
            .unwrap();
        storage
            .store_member(
                &txn,
                &Member {
                    id: "member-1".to_string(),
                    name: "Asha".to_string(),
                    plan_id: "plan-1".to_string(),
                    remaining_hours: 10.0,
                    mobile_number: Some("9876543210".to_string()),
                    validity_date: None,
                },
            )
            .unwrap();
        txn.commit().unwrap();

        SessionManager::new(storage)
    }

    #[test]
    fn start_and_query_table_state() {
        let manager = create_test_manager();

        assert!(manager.table_state("table-1").unwrap().is_available());

        let session = manager.start_session("table-1").unwrap();
        assert_eq!(session.status, SessionStatus::Running);

        match manager.table_state("table-1").unwrap() {
            TableState::Occupied { session } => {
                assert_eq!(session.status, SessionStatus::Running)
            }
            TableState::Available => panic!("expected occupied table"),
        }
    }

    #[test]
    fn start_unknown_table_fails() {
        let manager = create_test_manager();
        let result = manager.start_session("table-x");
        assert!(matches!(result, Err(SessionError::TableNotFound(_))));
    }

    #[test]
    fn double_start_rejected_and_session_untouched() {
        let manager = create_test_manager();

        let first = manager.start_session("table-1").unwrap();
        let result = manager.start_session("table-1");
        assert!(matches!(result, Err(SessionError::TableOccupied { .. })));

        let stored = manager.storage().get_session("table-1").unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[test]
    fn transition_on_missing_session_fails() {
        let manager = create_test_manager();
        assert!(matches!(
            manager.pause_session("table-1"),
            Err(SessionError::NoSession(_))
        ));
        assert!(matches!(
            manager.stop_session("table-1"),
            Err(SessionError::NoSession(_))
        ));
    }

    #[test]
    fn full_lifecycle_persists_each_step() {
        let manager = create_test_manager();

        manager.start_session("table-1").unwrap();
        let paused = manager.pause_session("table-1").unwrap();
        assert_eq!(paused.status, SessionStatus::Paused);
        assert_eq!(
            manager.storage().get_session("table-1").unwrap().unwrap(),
            paused
        );

        let resumed = manager.resume_session("table-1").unwrap();
        assert_eq!(resumed.status, SessionStatus::Running);

        let stopped = manager.stop_session("table-1").unwrap();
        assert_eq!(stopped.status, SessionStatus::Stopped);
        assert_eq!(
            manager.storage().get_session("table-1").unwrap().unwrap(),
            stopped
        );
    }

    #[test]
    fn add_item_before_start_creates_idle_session() {
        let manager = create_test_manager();

        let session = manager.add_item("table-1", "item-1").unwrap();
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.items.len(), 1);

        // Start absorbs the pre-seeded items
        let session = manager.start_session("table-1").unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.items.len(), 1);
    }

    #[test]
    fn add_unknown_item_fails() {
        let manager = create_test_manager();
        manager.start_session("table-1").unwrap();
        let result = manager.add_item("table-1", "item-x");
        assert!(matches!(result, Err(SessionError::MenuItemNotFound(_))));
    }

    #[test]
    fn remove_item_roundtrip() {
        let manager = create_test_manager();
        manager.start_session("table-1").unwrap();
        manager.add_item("table-1", "item-1").unwrap();
        manager.add_item("table-1", "item-1").unwrap();

        let session = manager.remove_item("table-1", "item-1").unwrap();
        assert_eq!(session.line("item-1").unwrap().quantity, 1);

        let session = manager.remove_item("table-1", "item-1").unwrap();
        assert!(session.items.is_empty());

        // Removing an absent item is a no-op, not an error
        let before = manager.storage().get_session("table-1").unwrap().unwrap();
        let session = manager.remove_item("table-1", "item-1").unwrap();
        assert_eq!(session.items, before.items);
    }

    #[test]
    fn attach_member_sets_customer_name() {
        let manager = create_test_manager();
        manager.start_session("table-1").unwrap();

        let session = manager.attach_member("table-1", "member-1").unwrap();
        assert_eq!(session.member_id.as_deref(), Some("member-1"));
        assert_eq!(session.customer_name, "Asha");

        let session = manager.detach_member("table-1").unwrap();
        assert!(session.member_id.is_none());
    }

    #[test]
    fn attach_expired_member_fails() {
        let manager = create_test_manager();

        let txn = manager.storage().begin_write().unwrap();
        manager
            .storage()
            .store_member(
                &txn,
                &Member {
                    id: "member-2".to_string(),
                    name: "Late Renewal".to_string(),
                    plan_id: "plan-1".to_string(),
                    remaining_hours: 5.0,
                    mobile_number: None,
                    // Long in the past
                    validity_date: Some(1),
                },
            )
            .unwrap();
        txn.commit().unwrap();

        manager.start_session("table-1").unwrap();
        let result = manager.attach_member("table-1", "member-2");
        assert!(matches!(result, Err(SessionError::MembershipExpired(_))));
    }

    #[tokio::test]
    async fn mutations_broadcast_events() {
        let manager = create_test_manager();
        let mut rx = manager.subscribe();

        manager.start_session("table-1").unwrap();
        manager.add_item("table-1", "item-1").unwrap();

        match rx.recv().await.unwrap() {
            SessionEvent::SessionStarted { table_id, .. } => assert_eq!(table_id, "table-1"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            SessionEvent::ItemAdded {
                item_id, quantity, ..
            } => {
                assert_eq!(item_id, "item-1");
                assert_eq!(quantity, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
