//! End-to-end settlement flows
//!
//! Drives the public API from catalog seeding through settlement and
//! checks the persisted outcome: ledger record, stock levels, membership
//! balance, and table availability. Elapsed time is frozen to known values
//! through the storage layer so the money assertions are exact.

use anyhow::Result;
use club_server::{CatalogService, ClubStorage, SessionManager, SettlementError};
use shared::models::{ClubTable, MemberCreate, MembershipPlan, MenuItem, TableCategory};
use shared::session::{PaymentInput, PaymentMethod, SessionEvent, TableState};

struct Club {
    manager: SessionManager,
    catalog: CatalogService,
    _dir: tempfile::TempDir,
}

fn club() -> Result<Club> {
    let dir = tempfile::tempdir()?;
    let storage = ClubStorage::open(dir.path().join("club.redb"))?;
    let catalog = CatalogService::new(storage.clone());

    catalog.upsert_table(&ClubTable {
        id: "table-1".to_string(),
        name: "American Pool 1".to_string(),
        category: TableCategory::AmericanPool,
        hourly_rate: 120.0,
    })?;
    catalog.upsert_menu_item(&MenuItem {
        id: "item-chips".to_string(),
        name: "Chips".to_string(),
        category: "Snacks".to_string(),
        price: 30.0,
        stock: 16,
    })?;
    catalog.upsert_plan(&MembershipPlan {
        id: "plan-gold".to_string(),
        name: "Gold".to_string(),
        description: None,
        price: 5000.0,
        total_hours: 2.0,
        color: None,
    })?;

    Ok(Club {
        manager: SessionManager::new(storage),
        catalog,
        _dir: dir,
    })
}

/// Stop the table's session and freeze its play time to `elapsed_seconds`.
fn stop_with_elapsed(manager: &SessionManager, table_id: &str, elapsed_seconds: i64) -> Result<()> {
    manager.stop_session(table_id)?;

    let storage = manager.storage();
    let mut session = storage.get_session(table_id)?.unwrap();
    session.elapsed_seconds = elapsed_seconds;
    let txn = storage.begin_write()?;
    storage.store_session(&txn, &mut session)?;
    txn.commit()?;
    Ok(())
}

#[test]
fn cash_settlement_writes_ledger_and_frees_table() -> Result<()> {
    let club = club()?;

    club.manager.start_session("table-1")?;
    club.manager.add_item("table-1", "item-chips")?;
    club.manager.add_item("table-1", "item-chips")?;
    stop_with_elapsed(&club.manager, "table-1", 5400)?;

    let record = club.manager.settle("table-1", &PaymentInput::Cash)?;

    // 1.5h at 120/hr + 2 x 30
    assert_eq!(record.table_cost, 180.0);
    assert_eq!(record.items_cost, 60.0);
    assert_eq!(record.total_amount, 240.0);
    assert_eq!(record.payment_method, PaymentMethod::Cash);
    assert_eq!(record.duration_seconds, 5400);
    assert_eq!(record.customer_name, "Walk-in Customer");
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].quantity, 2);

    // Ledger has exactly this record
    let ledger = club.catalog.list_transactions()?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0], record);

    // Stock decremented, table free again
    assert_eq!(
        club.catalog.menu_item_by_id("item-chips")?.unwrap().stock,
        14
    );
    assert!(matches!(
        club.manager.table_state("table-1")?,
        TableState::Available
    ));

    // And a fresh session can start immediately
    club.manager.start_session("table-1")?;
    Ok(())
}

#[test]
fn settle_requires_stopped_timer() -> Result<()> {
    let club = club()?;

    club.manager.start_session("table-1")?;
    let result = club.manager.settle("table-1", &PaymentInput::Cash);
    assert!(matches!(
        result,
        Err(SettlementError::SessionNotStopped { .. })
    ));

    // Session untouched by the rejection
    assert!(club.manager.storage().get_session("table-1")?.is_some());
    Ok(())
}

#[test]
fn split_settlement_validates_floored_sum() -> Result<()> {
    let club = club()?;

    club.manager.start_session("table-1")?;
    club.manager.add_item("table-1", "item-chips")?;
    club.manager.add_item("table-1", "item-chips")?;
    stop_with_elapsed(&club.manager, "table-1", 5400)?;

    // floor(100 + 139.99) = 239, payable is 240: rejected
    let result = club.manager.settle(
        "table-1",
        &PaymentInput::Split {
            cash_amount: 100.0,
            upi_amount: 139.99,
        },
    );
    assert!(matches!(result, Err(SettlementError::SplitMismatch { .. })));
    assert!(club.catalog.list_transactions()?.is_empty());

    // Exact cover settles and records both halves
    let record = club.manager.settle(
        "table-1",
        &PaymentInput::Split {
            cash_amount: 100.0,
            upi_amount: 140.0,
        },
    )?;
    assert_eq!(record.payment_method, PaymentMethod::Split);
    assert_eq!(record.cash_amount, Some(100.0));
    assert_eq!(record.upi_amount, Some(140.0));
    Ok(())
}

#[test]
fn membership_settlement_deducts_played_hours() -> Result<()> {
    let club = club()?;

    let member = club.catalog.enroll_member(MemberCreate {
        name: "Asha Rao".to_string(),
        plan_id: "plan-gold".to_string(),
        mobile_number: Some("9876543210".to_string()),
        validity_date: None,
    })?;
    assert_eq!(member.remaining_hours, 2.0);

    club.manager.start_session("table-1")?;
    club.manager.add_item("table-1", "item-chips")?;
    club.manager.add_item("table-1", "item-chips")?;
    club.manager.attach_member("table-1", &member.id)?;
    stop_with_elapsed(&club.manager, "table-1", 5400)?;

    let record = club.manager.settle("table-1", &PaymentInput::Membership)?;

    // Table time covered by hours: only items payable
    assert_eq!(record.total_amount, 60.0);
    assert_eq!(record.customer_name, "Asha Rao");

    // 2.0 - 1.5 = 0.5 hours left
    let after = club.catalog.member_by_id(&member.id)?.unwrap();
    assert_eq!(after.remaining_hours, 0.5);
    Ok(())
}

#[test]
fn membership_settlement_rejected_on_short_balance() -> Result<()> {
    let club = club()?;

    let member = club.catalog.enroll_member(MemberCreate {
        name: "Asha Rao".to_string(),
        plan_id: "plan-gold".to_string(),
        mobile_number: None,
        validity_date: None,
    })?;

    club.manager.start_session("table-1")?;
    club.manager.attach_member("table-1", &member.id)?;
    // 3h played, 2h balance
    stop_with_elapsed(&club.manager, "table-1", 10_800)?;

    let result = club.manager.settle("table-1", &PaymentInput::Membership);
    assert!(matches!(
        result,
        Err(SettlementError::InsufficientHours { .. })
    ));

    // Balance and session both intact
    assert_eq!(club.catalog.member_by_id(&member.id)?.unwrap().remaining_hours, 2.0);
    assert!(club.manager.storage().get_session("table-1")?.is_some());
    Ok(())
}

#[test]
fn failed_stock_lookup_rolls_back_every_effect() -> Result<()> {
    let club = club()?;

    club.manager.start_session("table-1")?;
    club.manager.add_item("table-1", "item-chips")?;
    stop_with_elapsed(&club.manager, "table-1", 3600)?;

    // A line whose catalog item has since been deleted
    let storage = club.manager.storage();
    let mut session = storage.get_session("table-1")?.unwrap();
    session.items.push(shared::session::OrderLine {
        item_id: "item-ghost".to_string(),
        name: "Deleted Item".to_string(),
        category: "Snacks".to_string(),
        price: 10.0,
        quantity: 1,
    });
    let txn = storage.begin_write()?;
    storage.store_session(&txn, &mut session)?;
    txn.commit()?;

    let result = club.manager.settle("table-1", &PaymentInput::Cash);
    assert!(matches!(result, Err(SettlementError::ItemNotFound(_))));

    // No record, no stock change, session still present
    assert!(club.catalog.list_transactions()?.is_empty());
    assert_eq!(
        club.catalog.menu_item_by_id("item-chips")?.unwrap().stock,
        16
    );
    assert!(club.manager.storage().get_session("table-1")?.is_some());
    Ok(())
}

#[tokio::test]
async fn settlement_broadcasts_event() -> Result<()> {
    let club = club()?;
    club.manager.start_session("table-1")?;
    stop_with_elapsed(&club.manager, "table-1", 3600)?;

    let mut rx = club.manager.subscribe();
    let record = club.manager.settle("table-1", &PaymentInput::Cash)?;

    match rx.recv().await? {
        SessionEvent::SessionSettled {
            table_id,
            transaction_id,
            total_amount,
        } => {
            assert_eq!(table_id, "table-1");
            assert_eq!(transaction_id, record.id);
            assert_eq!(total_amount, 120.0);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    Ok(())
}
