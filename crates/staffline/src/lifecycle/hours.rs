//! Working-hours ledger. The sum of live and banked hours stays constant
//! across any number of leave/reactivation cycles; both operations are called
//! only by the transition executor as part of an atomic commit.

use super::domain::Employee;

/// Copy the live allocation aside before a leave zeroes it, returning the
/// figure the target state should bank. Calling this while hours are already
/// banked keeps the original figure, so a double entry cannot wipe it.
pub(crate) fn zero_and_preserve(employee: &mut Employee) -> u32 {
    if let Some(banked) = employee.state.preserved_hours() {
        return banked;
    }
    let banked = employee.assigned_hours;
    employee.assigned_hours = 0;
    banked
}

/// Hand the banked allocation back on reactivation. The caller then moves the
/// state to a variant without banked hours; a state that banked nothing
/// restores nothing.
pub(crate) fn restore(employee: &mut Employee) {
    if let Some(banked) = employee.state.preserved_hours() {
        employee.assigned_hours = banked;
    }
}
