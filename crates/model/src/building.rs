use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default monthly committee fee charged per tenant when neither the tenant
/// nor the building overrides it.
pub const DEFAULT_MONTHLY_AMOUNT: f64 = 300.0;

/// Default amount moved into the petty cash ledger for every payment marked
/// paid.
pub const DEFAULT_PETTY_CASH_TRANSFER: f64 = 50.0;

/// Building entrance slot. Buildings have up to four entrances; entrance
/// codes and electricity contracts are keyed by this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Entrance {
    A,
    B,
    C,
    D,
}

impl Entrance {
    pub const ALL: [Entrance; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "C" | "c" => Some(Self::C),
            "D" | "d" => Some(Self::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevatorContact {
    pub company: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricitySlot {
    pub contract: String,
    pub meter: String,
}

/// Per-building settings. The two money amounts always exist (defaulted when
/// absent); everything else is optional equipment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSettings {
    pub name: String,
    pub monthly_amount: f64,
    pub petty_cash_transfer: f64,
    pub entrance_codes: BTreeMap<Entrance, String>,
    pub elevator: ElevatorContact,
    pub electricity: BTreeMap<Entrance, ElectricitySlot>,
}

impl BuildingSettings {
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            monthly_amount: DEFAULT_MONTHLY_AMOUNT,
            petty_cash_transfer: DEFAULT_PETTY_CASH_TRANSFER,
            entrance_codes: BTreeMap::new(),
            elevator: ElevatorContact::default(),
            electricity: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    Owner,
    Renter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Credit,
}

/// A tenant lives inside exactly one building's `tenants` list; there is no
/// cross-building reference to heal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub apartment: String,
    pub floor: i32,
    pub name: String,
    pub ownership: Ownership,
    /// Only meaningful when `ownership` is `Renter`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<String>,
    pub entrance: Entrance,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone2: Option<String>,
    /// Overrides the building's monthly amount when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_amount: Option<f64>,
    pub payment_method: PaymentMethod,
    /// Billing day of month, only meaningful for credit payers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_day: Option<u8>,
}

/// One month of committee fees for one tenant. Keyed by the
/// (tenantId, month, year) triple; at most one row per triple exists.
///
/// `amount` is a snapshot of what was charged when the row was first
/// created; later settings changes never rewrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub tenant_id: String,
    /// 1–12.
    pub month: u32,
    pub year: i32,
    pub paid: bool,
    pub amount: f64,
}

/// Closed expense category set. Unknown strings in stored documents heal to
/// `Other`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Cleaning,
    Gardening,
    Electricity,
    Water,
    Repairs,
    Security,
    Insurance,
    Legal,
    #[serde(other)]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 9] = [
        Self::Cleaning,
        Self::Gardening,
        Self::Electricity,
        Self::Water,
        Self::Repairs,
        Self::Security,
        Self::Insurance,
        Self::Legal,
        Self::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Cleaning => "Cleaning",
            Self::Gardening => "Gardening",
            Self::Electricity => "Electricity",
            Self::Water => "Water",
            Self::Repairs => "Repairs",
            Self::Security => "Security",
            Self::Insurance => "Insurance",
            Self::Legal => "Legal",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// System-owned marker: expenses generated from a resolved issue may only
    /// be touched by the issue linkage rules, never edited directly.
    #[serde(default)]
    pub from_issue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PettyCashKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PettyCashTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PettyCashKind,
    pub amount: f64,
}

impl PettyCashTransaction {
    /// Contribution to the running balance: income adds, expense subtracts.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            PettyCashKind::Income => self.amount,
            PettyCashKind::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
        }
    }
}

/// A reported maintenance problem. Any status transition is allowed;
/// entering `Resolved` with a positive cost materializes a linked expense,
/// leaving it removes the expense again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub date: NaiveDate,
    pub reporter_name: String,
    pub description: String,
    pub cost: f64,
    pub status: IssueStatus,
}

/// One managed property with its own tenants, ledgers and settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub name: String,
    pub settings: BuildingSettings,
    pub tenants: Vec<Tenant>,
    pub payments: Vec<Payment>,
    pub expenses: Vec<Expense>,
    pub petty_cash: Vec<PettyCashTransaction>,
    pub issues: Vec<Issue>,
}

impl Building {
    pub fn with_defaults(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            settings: BuildingSettings::with_defaults(name.clone()),
            name,
            tenants: Vec::new(),
            payments: Vec::new(),
            expenses: Vec::new(),
            petty_cash: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn tenant(&self, id: &str) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.id == id)
    }

    /// The amount a tenant is charged per month: their override, or the
    /// building default.
    pub fn monthly_amount_for(&self, tenant: &Tenant) -> f64 {
        tenant.monthly_amount.unwrap_or(self.settings.monthly_amount)
    }

    pub fn payment(&self, tenant_id: &str, month: u32, year: i32) -> Option<&Payment> {
        self.payments
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.month == month && p.year == year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> Tenant {
        Tenant {
            id: id.to_string(),
            apartment: "4".to_string(),
            floor: 2,
            name: "Dana".to_string(),
            ownership: Ownership::Owner,
            owner_name: None,
            owner_phone: None,
            entrance: Entrance::A,
            phone: "050-0000000".to_string(),
            phone2: None,
            monthly_amount: None,
            payment_method: PaymentMethod::Cash,
            credit_day: None,
        }
    }

    #[test]
    fn default_building_settings_carry_money_defaults() {
        let b = Building::with_defaults("b1", "North Tower");
        assert_eq!(b.settings.monthly_amount, DEFAULT_MONTHLY_AMOUNT);
        assert_eq!(b.settings.petty_cash_transfer, DEFAULT_PETTY_CASH_TRANSFER);
        assert_eq!(b.settings.name, "North Tower");
        assert!(b.tenants.is_empty());
    }

    #[test]
    fn monthly_amount_prefers_tenant_override() {
        let b = Building::with_defaults("b1", "North Tower");
        let mut t = tenant("t1");
        assert_eq!(b.monthly_amount_for(&t), DEFAULT_MONTHLY_AMOUNT);
        t.monthly_amount = Some(420.0);
        assert_eq!(b.monthly_amount_for(&t), 420.0);
    }

    #[test]
    fn petty_cash_signed_amount() {
        let mut tx = PettyCashTransaction {
            id: "x".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            description: "test".to_string(),
            kind: PettyCashKind::Income,
            amount: 50.0,
        };
        assert_eq!(tx.signed_amount(), 50.0);
        tx.kind = PettyCashKind::Expense;
        assert_eq!(tx.signed_amount(), -50.0);
    }

    #[test]
    fn issue_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
    }

    #[test]
    fn unknown_expense_category_heals_to_other() {
        let cat: ExpenseCategory = serde_json::from_str("\"plumbing\"").unwrap();
        assert_eq!(cat, ExpenseCategory::Other);
    }

    #[test]
    fn tenant_optional_fields_are_omitted_on_the_wire() {
        let json = serde_json::to_string(&tenant("t1")).unwrap();
        assert!(!json.contains("ownerName"));
        assert!(!json.contains("creditDay"));
        assert!(json.contains("\"paymentMethod\":\"cash\""));
    }
}
