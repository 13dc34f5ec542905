//! Derived reporting over the document.
//!
//! Read-only queries: everything here is computed from the current document
//! and owns nothing. The dashboard and the reminder flow are the consumers.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use vaadly_model::{Building, Document, ExpenseCategory, IssueStatus, Tenant};

/// Headline figures for one building's year, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub yearly_income: f64,
    pub yearly_expenses: f64,
    pub yearly_balance: f64,
    pub petty_cash_balance: f64,
    pub debtor_count: usize,
    pub open_issues: usize,
}

pub fn dashboard_summary(building: &Building, today: NaiveDate) -> DashboardSummary {
    let year = today.year();
    let income = yearly_income(building, year);
    let expenses = yearly_expenses(building, year);
    DashboardSummary {
        yearly_income: income,
        yearly_expenses: expenses,
        yearly_balance: income - expenses,
        petty_cash_balance: petty_cash_balance(building),
        debtor_count: debtors(building, today).len(),
        open_issues: open_issue_count(building),
    }
}

/// Sum of paid payment snapshots for `year`.
pub fn yearly_income(building: &Building, year: i32) -> f64 {
    building
        .payments
        .iter()
        .filter(|p| p.year == year && p.paid)
        .map(|p| p.amount)
        .sum()
}

pub fn yearly_expenses(building: &Building, year: i32) -> f64 {
    building
        .expenses
        .iter()
        .filter(|e| e.date.year() == year)
        .map(|e| e.amount)
        .sum()
}

/// Signed sum over the whole petty-cash ledger.
pub fn petty_cash_balance(building: &Building) -> f64 {
    building.petty_cash.iter().map(|t| t.signed_amount()).sum()
}

/// Months from January through the current month that `tenant` has not paid
/// this year.
pub fn unpaid_months(building: &Building, tenant: &Tenant, today: NaiveDate) -> Vec<u32> {
    let year = today.year();
    (1..=today.month())
        .filter(|&month| {
            !building
                .payment(&tenant.id, month, year)
                .is_some_and(|p| p.paid)
        })
        .collect()
}

/// Tenants owing at least one month this year, with the months they owe.
pub fn debtors<'a>(building: &'a Building, today: NaiveDate) -> Vec<(&'a Tenant, Vec<u32>)> {
    building
        .tenants
        .iter()
        .filter_map(|tenant| {
            let months = unpaid_months(building, tenant, today);
            (!months.is_empty()).then_some((tenant, months))
        })
        .collect()
}

/// What a tenant currently owes: unpaid months × their monthly amount.
pub fn total_due(building: &Building, tenant: &Tenant, today: NaiveDate) -> f64 {
    let months = unpaid_months(building, tenant, today);
    months.len() as f64 * building.monthly_amount_for(tenant)
}

pub fn open_issue_count(building: &Building) -> usize {
    building
        .issues
        .iter()
        .filter(|i| i.status != IssueStatus::Resolved)
        .count()
}

/// Yearly expenses grouped by category.
pub fn expenses_by_category(building: &Building, year: i32) -> BTreeMap<ExpenseCategory, f64> {
    let mut totals = BTreeMap::new();
    for expense in building.expenses.iter().filter(|e| e.date.year() == year) {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Catalog-wide inventory figures.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryTotals {
    pub products: usize,
    pub units: u64,
    pub stock_value: f64,
    /// Cumulative cost of all recorded usage.
    pub usage_cost: f64,
}

pub fn inventory_totals(document: &Document) -> InventoryTotals {
    InventoryTotals {
        products: document.inventory_products.len(),
        units: document
            .inventory_products
            .iter()
            .map(|p| u64::from(p.quantity))
            .sum(),
        stock_value: document
            .inventory_products
            .iter()
            .map(|p| p.stock_value())
            .sum(),
        usage_cost: document
            .inventory_transactions
            .iter()
            .filter(|t| t.kind == vaadly_model::InventoryTxKind::Use)
            .map(|t| t.cost)
            .sum(),
    }
}
