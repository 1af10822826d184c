//! Catalog service: tables, menu, plans, members, and ledger reads
//!
//! The CRUD screens that maintain these documents live outside this crate;
//! the engine needs seeded catalog data, the member search used by the
//! membership settlement flow, and read access to the settlement ledger.

use crate::storage::{ClubStorage, StorageError};
use shared::models::{ClubTable, Member, MemberCreate, MembershipPlan, MenuItem, SettledTransaction};
use std::collections::HashSet;
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Membership plan not found: {0}")]
    PlanNotFound(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog access over club storage.
#[derive(Clone)]
pub struct CatalogService {
    storage: ClubStorage,
}

impl CatalogService {
    pub fn new(storage: ClubStorage) -> Self {
        Self { storage }
    }

    // ========== Tables ==========

    pub fn upsert_table(&self, table: &ClubTable) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.store_table(&txn, table)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn table_by_id(&self, table_id: &str) -> CatalogResult<Option<ClubTable>> {
        Ok(self.storage.get_table(table_id)?)
    }

    pub fn list_tables(&self) -> CatalogResult<Vec<ClubTable>> {
        Ok(self.storage.list_tables()?)
    }

    // ========== Menu ==========

    pub fn upsert_menu_item(&self, item: &MenuItem) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.store_menu_item(&txn, item)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn menu_item_by_id(&self, item_id: &str) -> CatalogResult<Option<MenuItem>> {
        Ok(self.storage.get_menu_item(item_id)?)
    }

    pub fn list_menu_items(&self) -> CatalogResult<Vec<MenuItem>> {
        Ok(self.storage.list_menu_items()?)
    }

    // ========== Plans and members ==========

    pub fn upsert_plan(&self, plan: &MembershipPlan) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.store_plan(&txn, plan)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn plan_by_id(&self, plan_id: &str) -> CatalogResult<Option<MembershipPlan>> {
        Ok(self.storage.get_plan(plan_id)?)
    }

    /// Enroll a new member on a plan.
    ///
    /// The starting hours balance comes from the plan's `total_hours`.
    pub fn enroll_member(&self, create: MemberCreate) -> CatalogResult<Member> {
        let plan = self
            .plan_by_id(&create.plan_id)?
            .ok_or_else(|| CatalogError::PlanNotFound(create.plan_id.clone()))?;

        let member = Member {
            id: shared::util::new_doc_id(),
            name: create.name,
            plan_id: plan.id.clone(),
            remaining_hours: plan.total_hours,
            mobile_number: create.mobile_number,
            validity_date: create.validity_date,
        };

        let txn = self.storage.begin_write()?;
        self.storage.store_member(&txn, &member)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            member_id = %member.id,
            plan_id = %plan.id,
            hours = member.remaining_hours,
            "Member enrolled"
        );
        Ok(member)
    }

    pub fn upsert_member(&self, member: &Member) -> CatalogResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.store_member(&txn, member)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    pub fn member_by_id(&self, member_id: &str) -> CatalogResult<Option<Member>> {
        Ok(self.storage.get_member(member_id)?)
    }

    /// Search members by name prefix or exact mobile number.
    ///
    /// Two passes over the member set unioned by id: a case-insensitive
    /// prefix match on the name, then an exact match on the mobile number.
    /// Prefix search is not full-text; that matches how the membership
    /// screen queries.
    pub fn search_members(&self, term: &str) -> CatalogResult<Vec<Member>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let lowered = term.to_lowercase();

        let all = self.storage.list_members()?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut matches = Vec::new();

        for member in &all {
            if member.name.to_lowercase().starts_with(&lowered) && seen.insert(member.id.clone()) {
                matches.push(member.clone());
            }
        }
        for member in &all {
            if member.mobile_number.as_deref() == Some(term) && seen.insert(member.id.clone()) {
                matches.push(member.clone());
            }
        }

        Ok(matches)
    }

    // ========== Ledger ==========

    /// All settled transactions, oldest first.
    pub fn list_transactions(&self) -> CatalogResult<Vec<SettledTransaction>> {
        Ok(self.storage.list_transactions()?)
    }
}
