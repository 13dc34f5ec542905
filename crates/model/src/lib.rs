pub mod building;
pub mod document;
pub mod employee;
pub mod inventory;
pub mod migrate;
pub mod roster;

pub use building::{
    Building, BuildingSettings, ElectricitySlot, ElevatorContact, Entrance, Expense,
    ExpenseCategory, Issue, IssueStatus, Ownership, Payment, PaymentMethod,
    PettyCashKind, PettyCashTransaction, Tenant,
};
pub use document::{AppSettings, Document, TabId, month_name, new_id};
pub use employee::{Employee, PayrollBreakdown};
pub use inventory::{InventoryProduct, InventoryTransaction, InventoryTxKind};
pub use migrate::migrate;
