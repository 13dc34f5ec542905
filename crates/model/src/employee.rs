use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default number of working days per month used for the daily wage when a
/// new employee is created without an explicit figure.
pub const DEFAULT_WORK_DAYS_PER_MONTH: f64 = 21.67;

/// A building-independent employee (cleaner, gardener, ...). Employees are
/// global: one person can serve every managed building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub start_date: NaiveDate,
    pub base_salary: f64,
    pub work_days_per_month: f64,
    /// Absence days counted against the current month.
    pub absence_days: u32,
}

/// Salary figures derived from an employee's configuration, mirroring the
/// payroll card shown per employee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayrollBreakdown {
    pub base_salary: f64,
    pub daily_wage: f64,
    pub absence_days: u32,
    pub deduction: f64,
    pub payable: f64,
}

impl Employee {
    /// Base salary spread over the configured working days. A zero (healed)
    /// work-day figure yields a zero wage rather than a division blow-up.
    pub fn daily_wage(&self) -> f64 {
        if self.work_days_per_month <= 0.0 {
            return 0.0;
        }
        self.base_salary / self.work_days_per_month
    }

    pub fn payroll(&self) -> PayrollBreakdown {
        let daily_wage = self.daily_wage();
        let deduction = f64::from(self.absence_days) * daily_wage;
        PayrollBreakdown {
            base_salary: self.base_salary,
            daily_wage,
            absence_days: self.absence_days,
            deduction,
            payable: (self.base_salary - deduction).max(0.0),
        }
    }
}
