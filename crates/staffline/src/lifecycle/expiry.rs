//! Penalization expiry selection. Pure over the employee set: the executor
//! owns the reactivation commits and an external scheduler owns the cadence.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Employee, EmployeeId, EmployeeState};

/// A penalized employee nearing or past the end of a penalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringPenalization {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub ends_on: NaiveDate,
    pub days_left: i64,
}

/// Penalized employees whose penalization ends within `[today, today + days]`,
/// ordered soonest first. Re-running the selection restarts it from scratch.
pub fn expiring_within<'a, I>(employees: I, days: i64, today: NaiveDate) -> Vec<ExpiringPenalization>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let horizon = today + chrono::Duration::days(days);
    let mut expiring: Vec<ExpiringPenalization> = employees
        .into_iter()
        .filter_map(|employee| match &employee.state {
            EmployeeState::Penalizado { ends_on, .. } if *ends_on >= today && *ends_on <= horizon => {
                Some(ExpiringPenalization {
                    employee_id: employee.id.clone(),
                    full_name: employee.full_name.clone(),
                    ends_on: *ends_on,
                    days_left: (*ends_on - today).num_days(),
                })
            }
            _ => None,
        })
        .collect();

    expiring.sort_by(|a, b| a.ends_on.cmp(&b.ends_on));
    expiring
}

/// Whether an employee's penalization has run out and reactivation is due.
pub fn is_expired(employee: &Employee, today: NaiveDate) -> bool {
    matches!(&employee.state, EmployeeState::Penalizado { ends_on, .. } if *ends_on < today)
}
