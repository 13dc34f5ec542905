//! Schema healing for stored and imported documents.
//!
//! `migrate` accepts *anything* serde_json can parse and always returns a
//! schema-conformant [`Document`]: named migration steps (one per historical
//! shape change) run first over the raw JSON value, then a typed healing
//! pass fills every missing field with its default and replaces every
//! wrong-typed field. Malformed input is healed, never rejected.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::building::{
    Building, BuildingSettings, ElectricitySlot, ElevatorContact, Entrance, Expense,
    ExpenseCategory, Issue, IssueStatus, Ownership, Payment, PaymentMethod,
    PettyCashKind, PettyCashTransaction, Tenant, DEFAULT_MONTHLY_AMOUNT,
    DEFAULT_PETTY_CASH_TRANSFER,
};
use crate::document::{
    AppSettings, Document, TabId, new_id, DEFAULT_TITLE, DEFAULT_WHATSAPP_TEMPLATE,
};
use crate::employee::{Employee, DEFAULT_WORK_DAYS_PER_MONTH};
use crate::inventory::{InventoryProduct, InventoryTransaction, InventoryTxKind};

/// Heal an arbitrary JSON-like value into a schema-conformant document.
///
/// Guaranteed total: any input (`null`, a number, a half-filled document
/// from an old version) produces a valid [`Document`]. Idempotent:
/// `migrate(migrate(x)) == migrate(x)` up to freshly generated ids.
pub fn migrate(raw: Value) -> Document {
    let mut root = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    // Historical shape changes, oldest first.
    add_global_employees(&mut root);
    add_auto_backup_flag(&mut root);
    lift_whatsapp_template(&mut root);
    add_inventory(&mut root);

    heal(&root)
}

// ── versioned steps ───────────────────────────────────────────────────────────

/// Documents written before employees existed lack `globalEmployees`.
fn add_global_employees(root: &mut Map<String, Value>) {
    if !root.contains_key("globalEmployees") {
        debug!("migrate: adding empty globalEmployees");
        root.insert("globalEmployees".to_string(), Value::Array(Vec::new()));
    }
}

/// The auto-backup toggle arrived after the first release; default it on.
fn add_auto_backup_flag(root: &mut Map<String, Value>) {
    if let Some(Value::Object(settings)) = root.get_mut("settings") {
        if !settings.contains_key("autoBackupEnabled") {
            debug!("migrate: defaulting settings.autoBackupEnabled to true");
            settings.insert("autoBackupEnabled".to_string(), Value::Bool(true));
        }
    }
}

/// The reminder template used to live on every building; it is global now.
/// Strip the per-building copies and make sure the global one exists.
fn lift_whatsapp_template(root: &mut Map<String, Value>) {
    if let Some(Value::Array(buildings)) = root.get_mut("buildings") {
        for building in buildings.iter_mut() {
            if let Some(Value::Object(settings)) = building.get_mut("settings") {
                if settings.remove("whatsappTemplate").is_some() {
                    debug!("migrate: stripped legacy per-building whatsappTemplate");
                }
            }
        }
    }
    if let Some(Value::Object(settings)) = root.get_mut("settings") {
        if !settings.contains_key("whatsappTemplate") {
            debug!("migrate: defaulting global whatsappTemplate");
            settings.insert(
                "whatsappTemplate".to_string(),
                Value::String(DEFAULT_WHATSAPP_TEMPLATE.to_string()),
            );
        }
    }
}

/// The inventory arrived late and briefly had a per-location layout that was
/// dropped again. Add the current fields, strip the legacy one.
fn add_inventory(root: &mut Map<String, Value>) {
    for key in ["inventoryProducts", "inventoryTransactions"] {
        if !root.contains_key(key) {
            debug!(key, "migrate: adding empty inventory collection");
            root.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }
    if root.remove("inventoryLocations").is_some() {
        debug!("migrate: stripped legacy inventoryLocations");
    }
}

// ── typed healing pass ────────────────────────────────────────────────────────

fn heal(root: &Map<String, Value>) -> Document {
    let settings = heal_settings(root.get("settings"));

    let mut buildings: Vec<Building> = root
        .get("buildings")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(heal_building).collect())
        .unwrap_or_default();
    if buildings.is_empty() {
        debug!("migrate: no usable building found, synthesizing a default one");
        buildings.push(Building::with_defaults(new_id(), "Main Building"));
    }

    let mut current_building_id = string_or(root.get("currentBuildingId"), "");
    if !buildings.iter().any(|b| b.id == current_building_id) {
        debug!("migrate: currentBuildingId did not resolve, repointing to first building");
        current_building_id = buildings[0].id.clone();
    }

    Document {
        settings,
        buildings,
        current_building_id,
        global_employees: healed_list(root.get("globalEmployees"), heal_employee),
        inventory_products: healed_list(root.get("inventoryProducts"), heal_product),
        inventory_transactions: healed_list(
            root.get("inventoryTransactions"),
            heal_inventory_transaction,
        ),
    }
}

fn heal_settings(value: Option<&Value>) -> AppSettings {
    let map = object(value);
    let tab_order = match map.and_then(|m| m.get("tabOrder")).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(TabId::from_slug)
            .collect(),
        None => TabId::ALL.to_vec(),
    };
    AppSettings {
        title: nonempty_string_or(map.and_then(|m| m.get("title")), DEFAULT_TITLE),
        tab_order,
        auto_backup_enabled: bool_or(map.and_then(|m| m.get("autoBackupEnabled")), true),
        whatsapp_template: nonempty_string_or(
            map.and_then(|m| m.get("whatsappTemplate")),
            DEFAULT_WHATSAPP_TEMPLATE,
        ),
    }
}

fn heal_building(value: &Value) -> Option<Building> {
    let map = object(Some(value))?;
    let name = nonempty_string_or(map.get("name"), "Unnamed Building");

    let mut seen = HashSet::new();
    let mut payments: Vec<Payment> = healed_list(map.get("payments"), heal_payment);
    // At most one payment row may exist per (tenant, month, year); first wins.
    payments.retain(|p| seen.insert((p.tenant_id.clone(), p.month, p.year)));

    Some(Building {
        id: nonempty_string_or(map.get("id"), &new_id()),
        settings: heal_building_settings(map.get("settings"), &name),
        name,
        tenants: healed_list(map.get("tenants"), heal_tenant),
        payments,
        expenses: healed_list(map.get("expenses"), heal_expense),
        petty_cash: healed_list(map.get("pettyCash"), heal_petty_cash),
        issues: healed_list(map.get("issues"), heal_issue),
    })
}

fn heal_building_settings(value: Option<&Value>, building_name: &str) -> BuildingSettings {
    let map = object(value);

    let entrance_codes = object(map.and_then(|m| m.get("entranceCodes")))
        .map(|codes| {
            Entrance::ALL
                .into_iter()
                .filter_map(|entrance| {
                    codes
                        .get(entrance.label())
                        .and_then(Value::as_str)
                        .map(|code| (entrance, code.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let electricity = object(map.and_then(|m| m.get("electricity")))
        .map(|slots| {
            Entrance::ALL
                .into_iter()
                .filter_map(|entrance| {
                    let slot = object(slots.get(entrance.label()))?;
                    Some((
                        entrance,
                        ElectricitySlot {
                            contract: string_or(slot.get("contract"), ""),
                            meter: string_or(slot.get("meter"), ""),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let elevator = object(map.and_then(|m| m.get("elevator")))
        .map(|e| ElevatorContact {
            company: string_or(e.get("company"), ""),
            phone: string_or(e.get("phone"), ""),
        })
        .unwrap_or_default();

    BuildingSettings {
        name: nonempty_string_or(map.and_then(|m| m.get("name")), building_name),
        monthly_amount: f64_or(map.and_then(|m| m.get("monthlyAmount")), DEFAULT_MONTHLY_AMOUNT),
        petty_cash_transfer: f64_or(
            map.and_then(|m| m.get("pettyCashTransfer")),
            DEFAULT_PETTY_CASH_TRANSFER,
        ),
        entrance_codes,
        elevator,
        electricity,
    }
}

fn heal_tenant(value: &Value) -> Option<Tenant> {
    let map = object(Some(value))?;
    Some(Tenant {
        id: nonempty_string_or(map.get("id"), &new_id()),
        apartment: string_or(map.get("apartment"), ""),
        floor: i32_or(map.get("floor"), 0),
        name: string_or(map.get("name"), ""),
        ownership: enum_or(map.get("ownership"), Ownership::Owner),
        owner_name: optional_string(map.get("ownerName")),
        owner_phone: optional_string(map.get("ownerPhone")),
        entrance: enum_or(map.get("entrance"), Entrance::A),
        phone: string_or(map.get("phone"), ""),
        phone2: optional_string(map.get("phone2")),
        monthly_amount: map.get("monthlyAmount").and_then(Value::as_f64),
        payment_method: enum_or(map.get("paymentMethod"), PaymentMethod::Cash),
        credit_day: map
            .get("creditDay")
            .and_then(Value::as_u64)
            .map(|d| d.min(31) as u8),
    })
}

fn heal_payment(value: &Value) -> Option<Payment> {
    let map = object(Some(value))?;
    // A payment row that points at no tenant is unrecoverable garbage.
    let tenant_id = map.get("tenantId").and_then(Value::as_str)?.to_string();
    Some(Payment {
        tenant_id,
        month: u32_or(map.get("month"), 1).clamp(1, 12),
        year: i32_or(map.get("year"), 1970),
        paid: bool_or(map.get("paid"), false),
        amount: f64_or(map.get("amount"), 0.0),
    })
}

fn heal_expense(value: &Value) -> Option<Expense> {
    let map = object(Some(value))?;
    Some(Expense {
        id: nonempty_string_or(map.get("id"), &new_id()),
        date: date_or(map.get("date")),
        description: string_or(map.get("description"), ""),
        category: enum_or(map.get("category"), ExpenseCategory::Other),
        amount: f64_or(map.get("amount"), 0.0),
        notes: optional_string(map.get("notes")),
        from_issue: bool_or(map.get("fromIssue"), false),
        issue_id: optional_string(map.get("issueId")),
    })
}

fn heal_petty_cash(value: &Value) -> Option<PettyCashTransaction> {
    let map = object(Some(value))?;
    Some(PettyCashTransaction {
        id: nonempty_string_or(map.get("id"), &new_id()),
        date: date_or(map.get("date")),
        description: string_or(map.get("description"), ""),
        kind: enum_or(map.get("type"), PettyCashKind::Expense),
        amount: f64_or(map.get("amount"), 0.0),
    })
}

fn heal_issue(value: &Value) -> Option<Issue> {
    let map = object(Some(value))?;
    Some(Issue {
        id: nonempty_string_or(map.get("id"), &new_id()),
        date: date_or(map.get("date")),
        reporter_name: string_or(map.get("reporterName"), ""),
        description: string_or(map.get("description"), ""),
        cost: f64_or(map.get("cost"), 0.0),
        status: enum_or(map.get("status"), IssueStatus::Open),
    })
}

fn heal_employee(value: &Value) -> Option<Employee> {
    let map = object(Some(value))?;
    Some(Employee {
        id: nonempty_string_or(map.get("id"), &new_id()),
        name: string_or(map.get("name"), ""),
        phone: string_or(map.get("phone"), ""),
        start_date: date_or(map.get("startDate")),
        base_salary: f64_or(map.get("baseSalary"), 0.0),
        work_days_per_month: f64_or(
            map.get("workDaysPerMonth"),
            DEFAULT_WORK_DAYS_PER_MONTH,
        ),
        absence_days: u32_or(map.get("absenceDays"), 0),
    })
}

fn heal_product(value: &Value) -> Option<InventoryProduct> {
    let map = object(Some(value))?;
    Some(InventoryProduct {
        id: nonempty_string_or(map.get("id"), &new_id()),
        name: string_or(map.get("name"), ""),
        quantity: u32_or(map.get("quantity"), 0),
        price_per_unit: f64_or(map.get("pricePerUnit"), 0.0),
        created_at: datetime_or(map.get("createdAt")),
    })
}

fn heal_inventory_transaction(value: &Value) -> Option<InventoryTransaction> {
    let map = object(Some(value))?;
    // Ledger rows without a product reference cannot be attributed to
    // anything; drop them.
    let product_id = map.get("productId").and_then(Value::as_str)?.to_string();
    Some(InventoryTransaction {
        id: nonempty_string_or(map.get("id"), &new_id()),
        product_id,
        building_id: string_or(map.get("buildingId"), ""),
        building_name: string_or(map.get("buildingName"), ""),
        kind: enum_or(map.get("type"), InventoryTxKind::Use),
        quantity: u32_or(map.get("quantity"), 0),
        cost: f64_or(map.get("cost"), 0.0),
        notes: optional_string(map.get("notes")),
        date: date_or(map.get("date")),
        created_at: datetime_or(map.get("createdAt")),
    })
}

// ── field-level helpers ───────────────────────────────────────────────────────

fn object(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value.and_then(Value::as_object)
}

fn healed_list<T>(value: Option<&Value>, heal_one: fn(&Value) -> Option<T>) -> Vec<T> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(heal_one).collect())
        .unwrap_or_default()
}

fn string_or(value: Option<&Value>, default: &str) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn nonempty_string_or(value: Option<&Value>, default: &str) -> String {
    match value.and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn f64_or(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(default)
}

fn bool_or(value: Option<&Value>, default: bool) -> bool {
    value.and_then(Value::as_bool).unwrap_or(default)
}

fn i32_or(value: Option<&Value>, default: i32) -> i32 {
    value
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(default)
}

fn u32_or(value: Option<&Value>, default: u32) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

fn date_or(value: Option<&Value>) -> NaiveDate {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<NaiveDate>().ok())
        .unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is valid")
        })
}

fn datetime_or(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn enum_or<T: DeserializeOwned>(value: Option<&Value>, default: T) -> T {
    value
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(default)
}
