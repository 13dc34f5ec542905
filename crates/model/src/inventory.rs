use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry in the shared (building-independent) inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryProduct {
    pub id: String,
    pub name: String,
    /// Current stock level. Maintained transactionally together with the
    /// ledger: create + add quantities minus use quantities always equals
    /// this value.
    pub quantity: u32,
    pub price_per_unit: f64,
    pub created_at: DateTime<Utc>,
}

impl InventoryProduct {
    /// Current stock value at today's unit price.
    pub fn stock_value(&self) -> f64 {
        f64::from(self.quantity) * self.price_per_unit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryTxKind {
    Create,
    Add,
    Use,
}

/// One row in the inventory ledger.
///
/// `building_id`/`building_name` are a snapshot taken at transaction time,
/// not live references; the history keeps the name a building had even
/// after it is renamed or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: String,
    pub product_id: String,
    pub building_id: String,
    pub building_name: String,
    #[serde(rename = "type")]
    pub kind: InventoryTxKind,
    pub quantity: u32,
    /// quantity × the product's unit price at transaction time.
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
