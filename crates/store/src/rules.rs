//! Derived-consistency rules.
//!
//! Pure building/document transformations applied inside the store's update
//! closures. Linked entities are kept consistent here and only here: issues
//! materialize expenses, paid payments materialize petty-cash income, tenant
//! deletion cascades to payment rows. Each function takes a value and
//! returns the whole next value; nothing is mutated in place across the
//! store boundary.

use chrono::{Datelike, NaiveDate};

use vaadly_model::{
    month_name, new_id, Building, Employee, Expense, ExpenseCategory, Issue, IssueStatus,
    Payment, PettyCashKind, PettyCashTransaction, Tenant,
};

use crate::error::DomainError;

/// Prefix shared by every petty-cash transaction generated from a payment.
/// The full description is the deterministic tag that lets the rule find
/// (and remove) the transaction again.
pub const PAYMENT_DESCRIPTION_PREFIX: &str = "Payment ";

/// Deterministic petty-cash description for a paid (tenant, month).
pub fn payment_description(tenant_name: &str, month: u32) -> String {
    format!("{PAYMENT_DESCRIPTION_PREFIX}{tenant_name} - {}", month_name(month))
}

fn issue_expense_description(issue: &Issue) -> String {
    format!("Issue repair: {}", issue.description)
}

// ── issue ↔ expense linkage ───────────────────────────────────────────────────

/// Upsert an issue and reconcile its linked expense.
///
/// A resolved issue with a positive cost owns exactly one expense
/// (`issueId == issue.id`); any other state owns none. The expense id is
/// derived from the issue id, so at-most-one holds structurally.
pub fn apply_issue_upsert(mut building: Building, issue: Issue, today: NaiveDate) -> Building {
    match building.issues.iter_mut().find(|i| i.id == issue.id) {
        Some(slot) => *slot = issue.clone(),
        None => building.issues.push(issue.clone()),
    }

    if issue.status == IssueStatus::Resolved && issue.cost > 0.0 {
        match building
            .expenses
            .iter_mut()
            .find(|e| e.issue_id.as_deref() == Some(issue.id.as_str()))
        {
            Some(expense) => {
                expense.amount = issue.cost;
                expense.description = issue_expense_description(&issue);
            }
            None => building.expenses.push(Expense {
                id: format!("issue-{}", issue.id),
                date: today,
                description: issue_expense_description(&issue),
                category: ExpenseCategory::Repairs,
                amount: issue.cost,
                notes: Some(format!("Reported by: {}", issue.reporter_name)),
                from_issue: true,
                issue_id: Some(issue.id.clone()),
            }),
        }
    } else {
        building
            .expenses
            .retain(|e| e.issue_id.as_deref() != Some(issue.id.as_str()));
    }

    building
}

/// Delete an issue and its linked expense unconditionally.
pub fn remove_issue(mut building: Building, issue_id: &str) -> Building {
    building.issues.retain(|i| i.id != issue_id);
    building
        .expenses
        .retain(|e| e.issue_id.as_deref() != Some(issue_id));
    building
}

// ── expense guards ────────────────────────────────────────────────────────────

/// Add a user-entered expense. Issue-generated expenses can only be created
/// by the issue rules, never through this path.
pub fn add_expense(mut building: Building, expense: Expense) -> Result<Building, DomainError> {
    if expense.from_issue || expense.issue_id.is_some() {
        return Err(DomainError::InvalidOperation(
            "issue-generated expenses are system-owned".to_string(),
        ));
    }
    building.expenses.push(expense);
    Ok(building)
}

pub fn update_expense(
    mut building: Building,
    expense: Expense,
) -> Result<Building, DomainError> {
    let Some(existing) = building.expenses.iter_mut().find(|e| e.id == expense.id) else {
        return Err(DomainError::InvalidOperation(format!(
            "no expense with id {}",
            expense.id
        )));
    };
    if existing.from_issue || expense.from_issue {
        return Err(DomainError::InvalidOperation(
            "issue-generated expenses are system-owned".to_string(),
        ));
    }
    *existing = expense;
    Ok(building)
}

pub fn remove_expense(
    mut building: Building,
    expense_id: &str,
) -> Result<Building, DomainError> {
    match building.expenses.iter().find(|e| e.id == expense_id) {
        Some(expense) if expense.from_issue => Err(DomainError::InvalidOperation(
            "issue-generated expenses are system-owned".to_string(),
        )),
        _ => {
            building.expenses.retain(|e| e.id != expense_id);
            Ok(building)
        }
    }
}

// ── payment ↔ petty-cash linkage ──────────────────────────────────────────────

/// Flip the paid state for one (tenant, month, year) cell.
///
/// Unpaid→paid upserts the row (the charged amount is snapshotted only when
/// the row is first created) and materializes the matching petty-cash
/// income; paid→unpaid flips the flag and removes that income again.
pub fn toggle_payment(
    mut building: Building,
    tenant_id: &str,
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<Building, DomainError> {
    let tenant = building
        .tenant(tenant_id)
        .cloned()
        .ok_or_else(|| DomainError::InvalidOperation(format!("no tenant with id {tenant_id}")))?;

    let was_paid = building
        .payment(tenant_id, month, year)
        .is_some_and(|p| p.paid);

    if was_paid {
        set_paid_flag(&mut building, tenant_id, month, year, false);
        remove_payment_income(&mut building, &tenant.name, month);
    } else {
        let amount = building.monthly_amount_for(&tenant);
        upsert_paid_row(&mut building, &tenant, month, year, amount);
        push_payment_income_if_absent(&mut building, &tenant.name, month, today);
    }
    Ok(building)
}

/// Mark every unpaid month from January through the current month as paid,
/// for every tenant. Idempotent: months already paid are untouched and no
/// duplicate petty-cash income is created.
pub fn mark_all_due_paid(mut building: Building, today: NaiveDate) -> Building {
    let year = today.year();
    let current_month = today.month();

    for tenant in building.tenants.clone() {
        for month in 1..=current_month {
            let already_paid = building
                .payment(&tenant.id, month, year)
                .is_some_and(|p| p.paid);
            if already_paid {
                continue;
            }
            let amount = building.monthly_amount_for(&tenant);
            upsert_paid_row(&mut building, &tenant, month, year, amount);
            push_payment_income_if_absent(&mut building, &tenant.name, month, today);
        }
    }
    building
}

/// Rewrite every payment-generated petty-cash amount to the building's
/// current transfer amount (retroactive resync after a settings change).
pub fn resync_payment_petty_cash(mut building: Building) -> Building {
    let transfer = building.settings.petty_cash_transfer;
    for tx in &mut building.petty_cash {
        if tx.kind == PettyCashKind::Income
            && tx.description.starts_with(PAYMENT_DESCRIPTION_PREFIX)
        {
            tx.amount = transfer;
        }
    }
    building
}

fn set_paid_flag(building: &mut Building, tenant_id: &str, month: u32, year: i32, paid: bool) {
    if let Some(row) = building
        .payments
        .iter_mut()
        .find(|p| p.tenant_id == tenant_id && p.month == month && p.year == year)
    {
        row.paid = paid;
    }
}

fn upsert_paid_row(building: &mut Building, tenant: &Tenant, month: u32, year: i32, amount: f64) {
    match building
        .payments
        .iter_mut()
        .find(|p| p.tenant_id == tenant.id && p.month == month && p.year == year)
    {
        Some(row) => row.paid = true,
        None => building.payments.push(Payment {
            tenant_id: tenant.id.clone(),
            month,
            year,
            paid: true,
            amount,
        }),
    }
}

fn push_payment_income_if_absent(
    building: &mut Building,
    tenant_name: &str,
    month: u32,
    today: NaiveDate,
) {
    let description = payment_description(tenant_name, month);
    let exists = building
        .petty_cash
        .iter()
        .any(|t| t.kind == PettyCashKind::Income && t.description == description);
    if exists {
        return;
    }
    building.petty_cash.push(PettyCashTransaction {
        id: new_id(),
        date: today,
        description,
        kind: PettyCashKind::Income,
        amount: building.settings.petty_cash_transfer,
    });
}

fn remove_payment_income(building: &mut Building, tenant_name: &str, month: u32) {
    let description = payment_description(tenant_name, month);
    building
        .petty_cash
        .retain(|t| !(t.kind == PettyCashKind::Income && t.description == description));
}

// ── tenant cascade ────────────────────────────────────────────────────────────

pub fn upsert_tenant(mut building: Building, tenant: Tenant) -> Building {
    match building.tenants.iter_mut().find(|t| t.id == tenant.id) {
        Some(slot) => *slot = tenant,
        None => building.tenants.push(tenant),
    }
    building
}

/// Delete a tenant and every payment row referencing them.
pub fn remove_tenant(mut building: Building, tenant_id: &str) -> Building {
    building.tenants.retain(|t| t.id != tenant_id);
    building.payments.retain(|p| p.tenant_id != tenant_id);
    building
}

// ── employees ─────────────────────────────────────────────────────────────────

/// New employees always start the month with a clean absence slate,
/// whatever the caller filled in.
pub fn add_employee(mut employees: Vec<Employee>, mut employee: Employee) -> Vec<Employee> {
    employee.absence_days = 0;
    employees.push(employee);
    employees
}

#[cfg(test)]
mod tests {
    use vaadly_model::{Document, Ownership, PaymentMethod, Entrance};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn building_with_tenant() -> Building {
        let mut b = Building::with_defaults("b1", "North");
        b.tenants.push(Tenant {
            id: "t1".to_string(),
            apartment: "4".to_string(),
            floor: 2,
            name: "Dana".to_string(),
            ownership: Ownership::Owner,
            owner_name: None,
            owner_phone: None,
            entrance: Entrance::A,
            phone: "050".to_string(),
            phone2: None,
            monthly_amount: None,
            payment_method: PaymentMethod::Cash,
            credit_day: None,
        });
        b
    }

    fn issue(id: &str, status: IssueStatus, cost: f64) -> Issue {
        Issue {
            id: id.to_string(),
            date: today(),
            reporter_name: "Dana".to_string(),
            description: "leaking pipe".to_string(),
            cost,
            status,
        }
    }

    // ── issues ──

    #[test]
    fn resolving_with_cost_materializes_one_expense() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());

        assert_eq!(b.issues.len(), 1);
        assert_eq!(b.expenses.len(), 1);
        let expense = &b.expenses[0];
        assert!(expense.from_issue);
        assert_eq!(expense.issue_id.as_deref(), Some("i1"));
        assert_eq!(expense.amount, 450.0);
        assert_eq!(expense.category, ExpenseCategory::Repairs);
        assert_eq!(expense.description, "Issue repair: leaking pipe");
    }

    #[test]
    fn re_resolving_updates_the_expense_in_place() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let mut updated = issue("i1", IssueStatus::Resolved, 600.0);
        updated.description = "replaced pipe".to_string();
        let b = apply_issue_upsert(b, updated, today());

        assert_eq!(b.expenses.len(), 1);
        assert_eq!(b.expenses[0].amount, 600.0);
        assert_eq!(b.expenses[0].description, "Issue repair: replaced pipe");
    }

    #[test]
    fn leaving_resolved_removes_the_expense() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Open, 450.0), today());
        assert!(b.expenses.is_empty());
        assert_eq!(b.issues.len(), 1);
    }

    #[test]
    fn resolve_open_resolve_cycle_ends_with_exactly_one_expense() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Open, 450.0), today());
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());

        assert_eq!(b.expenses.len(), 1);
        assert_eq!(b.expenses[0].amount, 450.0);
    }

    #[test]
    fn resolved_with_zero_cost_owns_no_expense() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 0.0), today());
        assert!(b.expenses.is_empty());
    }

    #[test]
    fn deleting_an_issue_cascades_to_its_expense() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let b = remove_issue(b, "i1");
        assert!(b.issues.is_empty());
        assert!(b.expenses.is_empty());
    }

    // ── expense guards ──

    #[test]
    fn issue_expenses_cannot_be_deleted_directly() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let expense_id = b.expenses[0].id.clone();
        let err = remove_expense(b, &expense_id).unwrap_err();
        assert!(matches!(err, DomainError::InvalidOperation(_)));
    }

    #[test]
    fn issue_expenses_cannot_be_edited_directly() {
        let b = Building::with_defaults("b1", "North");
        let b = apply_issue_upsert(b, issue("i1", IssueStatus::Resolved, 450.0), today());
        let mut tampered = b.expenses[0].clone();
        tampered.amount = 1.0;
        assert!(update_expense(b, tampered).is_err());
    }

    #[test]
    fn user_expenses_can_be_managed_directly() {
        let b = Building::with_defaults("b1", "North");
        let expense = Expense {
            id: "e1".to_string(),
            date: today(),
            description: "stairwell soap".to_string(),
            category: ExpenseCategory::Cleaning,
            amount: 40.0,
            notes: None,
            from_issue: false,
            issue_id: None,
        };
        let b = add_expense(b, expense.clone()).unwrap();
        let mut edited = expense;
        edited.amount = 45.0;
        let b = update_expense(b, edited).unwrap();
        assert_eq!(b.expenses[0].amount, 45.0);
        let b = remove_expense(b, "e1").unwrap();
        assert!(b.expenses.is_empty());
    }

    #[test]
    fn user_expense_cannot_claim_an_issue_link() {
        let b = Building::with_defaults("b1", "North");
        let expense = Expense {
            id: "e1".to_string(),
            date: today(),
            description: "fake".to_string(),
            category: ExpenseCategory::Repairs,
            amount: 40.0,
            notes: None,
            from_issue: true,
            issue_id: Some("i9".to_string()),
        };
        assert!(add_expense(b, expense).is_err());
    }

    // ── payments ──

    #[test]
    fn marking_paid_creates_row_and_petty_cash_income() {
        let b = building_with_tenant();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();

        let row = b.payment("t1", 3, 2025).unwrap();
        assert!(row.paid);
        assert_eq!(row.amount, b.settings.monthly_amount);

        assert_eq!(b.petty_cash.len(), 1);
        let tx = &b.petty_cash[0];
        assert_eq!(tx.kind, PettyCashKind::Income);
        assert_eq!(tx.amount, b.settings.petty_cash_transfer);
        assert_eq!(tx.description, "Payment Dana - March");
    }

    #[test]
    fn unmarking_removes_the_income_and_keeps_the_row() {
        let b = building_with_tenant();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();

        let row = b.payment("t1", 3, 2025).unwrap();
        assert!(!row.paid);
        assert!(b.petty_cash.is_empty());
    }

    #[test]
    fn double_toggle_cycle_restores_row_and_leaves_one_income() {
        let b = building_with_tenant();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        let original = b.payment("t1", 3, 2025).unwrap().clone();

        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();

        assert_eq!(b.payment("t1", 3, 2025).unwrap(), &original);
        assert_eq!(b.payments.len(), 1);
        assert_eq!(b.petty_cash.len(), 1);
    }

    #[test]
    fn amount_snapshot_survives_settings_changes() {
        let mut b = building_with_tenant();
        b.settings.monthly_amount = 300.0;
        let mut b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        b.settings.monthly_amount = 999.0;
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        let b = toggle_payment(b, "t1", 3, 2025, today()).unwrap();
        assert_eq!(b.payment("t1", 3, 2025).unwrap().amount, 300.0);
    }

    #[test]
    fn tenant_override_sets_the_snapshot_amount() {
        let mut b = building_with_tenant();
        b.tenants[0].monthly_amount = Some(250.0);
        let b = toggle_payment(b, "t1", 5, 2025, today()).unwrap();
        assert_eq!(b.payment("t1", 5, 2025).unwrap().amount, 250.0);
    }

    #[test]
    fn toggle_for_unknown_tenant_is_rejected() {
        let b = building_with_tenant();
        assert!(toggle_payment(b, "ghost", 3, 2025, today()).is_err());
    }

    #[test]
    fn mark_all_due_paid_fills_january_through_current_month() {
        let b = building_with_tenant();
        let b = mark_all_due_paid(b, today());

        assert_eq!(b.payments.len(), 6);
        assert!(b.payments.iter().all(|p| p.paid && p.year == 2025));
        assert_eq!(b.petty_cash.len(), 6);
    }

    #[test]
    fn mark_all_due_paid_is_idempotent() {
        let b = building_with_tenant();
        let b = mark_all_due_paid(b, today());
        let b = mark_all_due_paid(b, today());

        assert_eq!(b.payments.len(), 6);
        assert_eq!(b.petty_cash.len(), 6);
    }

    #[test]
    fn mark_all_due_paid_skips_already_paid_months() {
        let b = building_with_tenant();
        let b = toggle_payment(b, "t1", 2, 2025, today()).unwrap();
        let b = mark_all_due_paid(b, today());

        assert_eq!(b.payments.len(), 6);
        assert_eq!(b.petty_cash.len(), 6);
    }

    #[test]
    fn resync_rewrites_only_payment_income() {
        let b = building_with_tenant();
        let mut b = toggle_payment(b, "t1", 1, 2025, today()).unwrap();
        b.petty_cash.push(PettyCashTransaction {
            id: "manual".to_string(),
            date: today(),
            description: "Bought bulbs".to_string(),
            kind: PettyCashKind::Expense,
            amount: 30.0,
        });
        b.settings.petty_cash_transfer = 80.0;
        let b = resync_payment_petty_cash(b);

        assert_eq!(b.petty_cash[0].amount, 80.0);
        assert_eq!(b.petty_cash[1].amount, 30.0);
    }

    // ── tenants ──

    #[test]
    fn deleting_a_tenant_cascades_to_payment_rows() {
        let b = building_with_tenant();
        let b = toggle_payment(b, "t1", 1, 2025, today()).unwrap();
        let b = toggle_payment(b, "t1", 2, 2025, today()).unwrap();
        let b = remove_tenant(b, "t1");

        assert!(b.tenants.is_empty());
        assert!(b.payments.is_empty());
        // Petty-cash history is a ledger, not a reference, so it stays.
        assert_eq!(b.petty_cash.len(), 2);
    }

    // ── employees ──

    #[test]
    fn new_employees_start_with_zero_absences() {
        let doc = Document::with_defaults();
        let employee = Employee {
            id: "e1".to_string(),
            name: "Yossi".to_string(),
            phone: "050".to_string(),
            start_date: today(),
            base_salary: 3000.0,
            work_days_per_month: 21.67,
            absence_days: 9,
        };
        let employees = add_employee(doc.global_employees, employee);
        assert_eq!(employees[0].absence_days, 0);
    }
}
