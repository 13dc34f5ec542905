//! Domain operations on the document store.
//!
//! Thin wiring between the store's update closures and the pure rules in
//! [`crate::rules`] / [`crate::inventory`]. UI collaborators call these;
//! nothing here bypasses the rules, so the linkage invariants hold for
//! every document the store ever produces.

use chrono::{DateTime, NaiveDate, Utc};

use vaadly_model::{
    AppSettings, Building, BuildingSettings, Employee, Expense, Issue,
    PettyCashTransaction, TabId, Tenant,
};

use crate::backup::{self, SnapshotInfo};
use crate::error::{ImportError, StoreError, UpdateError};
use crate::inventory;
use crate::portability;
use crate::rules;
use crate::store::DocumentStore;

impl DocumentStore {
    // ── issues ──

    pub fn upsert_issue(&mut self, issue: Issue, today: NaiveDate) -> Result<(), StoreError> {
        self.update_building(|b| rules::apply_issue_upsert(b, issue, today))
    }

    pub fn delete_issue(&mut self, issue_id: &str) -> Result<(), StoreError> {
        self.update_building(|b| rules::remove_issue(b, issue_id))
    }

    // ── expenses ──

    pub fn add_expense(&mut self, expense: Expense) -> Result<(), UpdateError> {
        self.try_update_building(|b| rules::add_expense(b, expense))
    }

    pub fn update_expense(&mut self, expense: Expense) -> Result<(), UpdateError> {
        self.try_update_building(|b| rules::update_expense(b, expense))
    }

    pub fn delete_expense(&mut self, expense_id: &str) -> Result<(), UpdateError> {
        self.try_update_building(|b| rules::remove_expense(b, expense_id))
    }

    // ── payments & petty cash ──

    pub fn toggle_payment(
        &mut self,
        tenant_id: &str,
        month: u32,
        year: i32,
        today: NaiveDate,
    ) -> Result<(), UpdateError> {
        self.try_update_building(|b| rules::toggle_payment(b, tenant_id, month, year, today))
    }

    pub fn mark_all_due_paid(&mut self, today: NaiveDate) -> Result<(), StoreError> {
        self.update_building(|b| rules::mark_all_due_paid(b, today))
    }

    pub fn resync_payment_petty_cash(&mut self) -> Result<(), StoreError> {
        self.update_building(rules::resync_payment_petty_cash)
    }

    pub fn add_petty_cash_transaction(
        &mut self,
        tx: PettyCashTransaction,
    ) -> Result<(), StoreError> {
        self.update_building(|mut b| {
            b.petty_cash.push(tx);
            b
        })
    }

    pub fn delete_petty_cash_transaction(&mut self, tx_id: &str) -> Result<(), StoreError> {
        self.update_building(|mut b| {
            b.petty_cash.retain(|t| t.id != tx_id);
            b
        })
    }

    // ── tenants ──

    pub fn upsert_tenant(&mut self, tenant: Tenant) -> Result<(), StoreError> {
        self.update_building(|b| rules::upsert_tenant(b, tenant))
    }

    /// Deleting a tenant cascades deletion of their payment rows.
    pub fn delete_tenant(&mut self, tenant_id: &str) -> Result<(), StoreError> {
        self.update_building(|b| rules::remove_tenant(b, tenant_id))
    }

    /// Append roster-imported tenants to the current building.
    pub fn import_tenants(&mut self, tenants: Vec<Tenant>) -> Result<(), StoreError> {
        self.update_building(|mut b| {
            b.tenants.extend(tenants);
            b
        })
    }

    // ── employees ──

    pub fn add_employee(&mut self, employee: Employee) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.global_employees = rules::add_employee(doc.global_employees, employee);
            doc
        })
    }

    pub fn update_employee(&mut self, employee: Employee) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            if let Some(slot) = doc.global_employees.iter_mut().find(|e| e.id == employee.id) {
                *slot = employee;
            }
            doc
        })
    }

    pub fn delete_employee(&mut self, employee_id: &str) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.global_employees.retain(|e| e.id != employee_id);
            doc
        })
    }

    pub fn set_absence_days(&mut self, employee_id: &str, days: u32) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            if let Some(e) = doc.global_employees.iter_mut().find(|e| e.id == employee_id) {
                e.absence_days = days;
            }
            doc
        })
    }

    // ── inventory ──

    pub fn create_product(
        &mut self,
        name: &str,
        quantity: u32,
        price_per_unit: f64,
        now: DateTime<Utc>,
    ) -> Result<(), UpdateError> {
        self.try_update_document(|doc| {
            inventory::create_product(doc, name, quantity, price_per_unit, now)
        })
    }

    pub fn update_product(
        &mut self,
        product_id: &str,
        name: &str,
        price_per_unit: f64,
    ) -> Result<(), UpdateError> {
        self.try_update_document(|doc| {
            inventory::update_product(doc, product_id, name, price_per_unit)
        })
    }

    pub fn add_stock(
        &mut self,
        product_id: &str,
        quantity: u32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UpdateError> {
        self.try_update_document(|doc| inventory::add_stock(doc, product_id, quantity, notes, now))
    }

    pub fn use_stock(
        &mut self,
        product_id: &str,
        quantity: u32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), UpdateError> {
        self.try_update_document(|doc| inventory::use_stock(doc, product_id, quantity, notes, now))
    }

    pub fn delete_product(&mut self, product_id: &str) -> Result<(), StoreError> {
        self.update_document(|doc| inventory::remove_product(doc, product_id))
    }

    // ── settings ──

    pub fn set_title(&mut self, title: &str) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.settings.title = title.to_string();
            doc
        })
    }

    pub fn set_tab_order(&mut self, tab_order: Vec<TabId>) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.settings.tab_order = tab_order;
            doc
        })
    }

    pub fn set_auto_backup_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.settings.auto_backup_enabled = enabled;
            doc
        })
    }

    pub fn set_whatsapp_template(&mut self, template: &str) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            doc.settings.whatsapp_template = template.to_string();
            doc
        })
    }

    pub fn app_settings(&self) -> &AppSettings {
        &self.document().settings
    }

    /// Replace the current building's settings wholesale.
    pub fn update_building_settings(
        &mut self,
        settings: BuildingSettings,
    ) -> Result<(), StoreError> {
        self.update_building(|mut b: Building| {
            b.settings = settings;
            b
        })
    }

    /// Rename a building (display name and settings name move together).
    pub fn rename_building(&mut self, building_id: &str, name: &str) -> Result<(), StoreError> {
        self.update_document(|mut doc| {
            if let Some(b) = doc.buildings.iter_mut().find(|b| b.id == building_id) {
                b.name = name.to_string();
                b.settings.name = name.to_string();
            }
            doc
        })
    }

    // ── backup ──

    pub fn is_backup_due(&self, today: NaiveDate) -> Result<bool, StoreError> {
        backup::is_backup_due(self.kv.as_ref(), today)
    }

    pub fn last_backup_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        backup::last_backup_date(self.kv.as_ref())
    }

    /// Daily snapshot, skipped when the document disables auto-backup.
    /// Storage failures degrade to a skipped day, never an error.
    pub fn run_daily_backup_if_due(&mut self, today: NaiveDate) -> bool {
        if !self.document.settings.auto_backup_enabled {
            return false;
        }
        let retention = self.backup_retention;
        backup::run_daily_backup_if_due(self.kv.as_mut(), &self.document, today, retention)
    }

    /// Manual snapshot: stamps the marker and returns the bytes for the
    /// export boundary to hand to the user.
    pub fn force_backup(&mut self, today: NaiveDate) -> Result<Vec<u8>, StoreError> {
        backup::force_backup(self.kv.as_mut(), &self.document, today)
    }

    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>, StoreError> {
        backup::list_snapshots(self.kv.as_ref())
    }

    pub fn snapshot(&self, date: NaiveDate) -> Result<Option<Vec<u8>>, StoreError> {
        backup::get_snapshot(self.kv.as_ref(), date)
    }

    pub fn prune_old_snapshots(&mut self) -> Result<usize, StoreError> {
        let retention = self.backup_retention;
        backup::prune_old_snapshots(self.kv.as_mut(), retention)
    }

    // ── import / export ──

    pub fn export_snapshot(&self) -> Result<Vec<u8>, StoreError> {
        portability::export_snapshot(&self.document)
    }

    /// Install an externally supplied snapshot as the new document. The
    /// payload goes through the same migrator as the startup load; a parse
    /// failure leaves the current document unchanged.
    pub fn import_snapshot(&mut self, bytes: &[u8]) -> Result<(), ImportError> {
        let document = portability::import_snapshot(bytes)?;
        self.document = document;
        self.persist()?;
        Ok(())
    }
}
