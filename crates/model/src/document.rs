use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::building::Building;
use crate::employee::Employee;
use crate::inventory::{InventoryProduct, InventoryTransaction};

/// Default title shown in the header and used when healing documents that
/// predate a configurable title.
pub const DEFAULT_TITLE: &str = "Building Committee Manager";

/// Global reminder template. `{name}`, `{total}` and `{months}` are filled in
/// by the reminder renderer.
pub const DEFAULT_WHATSAPP_TEMPLATE: &str = "Hello {name},\n\
This is a reminder that a payment of {total} is due for the months: {months}.\n\
Please contact us to arrange the payment.\n\
Thank you, the building committee";

/// Identifier for a fresh entity. The document is a JSON artifact, so ids are
/// plain strings on the wire; v4 UUIDs keep them collision-free.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The navigation tabs a document can order.
///
/// Serialized with their camelCase slug (`pettyCash` etc.). Unknown slugs in
/// a stored document are dropped during healing, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabId {
    Dashboard,
    Inventory,
    Tenants,
    Payments,
    Expenses,
    PettyCash,
    Employees,
    Issues,
    Settings,
}

impl TabId {
    pub const ALL: [TabId; 9] = [
        Self::Dashboard,
        Self::Inventory,
        Self::Tenants,
        Self::Payments,
        Self::Expenses,
        Self::PettyCash,
        Self::Employees,
        Self::Issues,
        Self::Settings,
    ];

    /// Canonical display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Inventory => "Inventory",
            Self::Tenants => "Tenants",
            Self::Payments => "Payments",
            Self::Expenses => "Expenses",
            Self::PettyCash => "Petty cash",
            Self::Employees => "Employees",
            Self::Issues => "Issues",
            Self::Settings => "Settings",
        }
    }

    /// The camelCase slug used on the wire and in `tabOrder`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Inventory => "inventory",
            Self::Tenants => "tenants",
            Self::Payments => "payments",
            Self::Expenses => "expenses",
            Self::PettyCash => "pettyCash",
            Self::Employees => "employees",
            Self::Issues => "issues",
            Self::Settings => "settings",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == s)
    }
}

/// Application-wide settings carried inside the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub title: String,
    pub tab_order: Vec<TabId>,
    pub auto_backup_enabled: bool,
    /// Global reminder template shared by every building. Older documents
    /// carried one per building; healing lifts it here.
    #[serde(rename = "whatsappTemplate")]
    pub whatsapp_template: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            tab_order: TabId::ALL.to_vec(),
            auto_backup_enabled: true,
            whatsapp_template: DEFAULT_WHATSAPP_TEMPLATE.to_string(),
        }
    }
}

/// The single root object persisted as the whole application state.
///
/// Owned exclusively by the document store for the process lifetime; every
/// mutation produces a whole new value from the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub settings: AppSettings,
    pub buildings: Vec<Building>,
    pub current_building_id: String,
    pub global_employees: Vec<Employee>,
    pub inventory_products: Vec<InventoryProduct>,
    pub inventory_transactions: Vec<InventoryTransaction>,
}

impl Document {
    /// A fresh document with one default building, used on first boot and
    /// whenever healing finds no usable building at all.
    pub fn with_defaults() -> Self {
        let building = Building::with_defaults(new_id(), "Main Building");
        let current_building_id = building.id.clone();
        Self {
            settings: AppSettings::default(),
            buildings: vec![building],
            current_building_id,
            global_employees: Vec::new(),
            inventory_products: Vec::new(),
            inventory_transactions: Vec::new(),
        }
    }

    pub fn current_building(&self) -> Option<&Building> {
        self.buildings
            .iter()
            .find(|b| b.id == self.current_building_id)
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }
}

/// English month name for a 1-based month number. Out-of-range input clamps
/// to December rather than panicking; callers always pass 1–12.
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[(month.clamp(1, 12) - 1) as usize]
}
