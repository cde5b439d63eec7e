use super::domain::{ActorRole, EmployeeStatus};

use EmployeeStatus::*;

/// Directed edge table for legal status transitions. Each edge carries the
/// minimal privilege allowed to drive it; the executor performs that check
/// once, so no call site re-derives authorization rules.
const EDGES: &[(EmployeeStatus, EmployeeStatus, ActorRole)] = &[
    // Activation: the final external ID arrives and the placeholder retires.
    (PendienteActivacion, Active, ActorRole::Admin),
    // Leaves and penalties open from the active roster.
    (Active, ItLeave, ActorRole::Staff),
    (Active, CompanyLeavePending, ActorRole::Staff),
    (Active, Penalizado, ActorRole::Staff),
    (Active, PendingLaboral, ActorRole::Staff),
    // Two-phase company leave: approval archives, rejection reinstates.
    (CompanyLeavePending, CompanyLeaveApproved, ActorRole::Admin),
    (CompanyLeavePending, Active, ActorRole::Admin),
    // Reactivation paths. CompanyLeaveApproved is terminal: no outgoing edges.
    (ItLeave, Active, ActorRole::Staff),
    (Penalizado, Active, ActorRole::Staff),
    (PendingLaboral, Active, ActorRole::Staff),
];

/// The privilege floor for a transition, or `None` when the edge is illegal.
pub fn required_role(from: EmployeeStatus, to: EmployeeStatus) -> Option<ActorRole> {
    EDGES
        .iter()
        .find(|(edge_from, edge_to, _)| *edge_from == from && *edge_to == to)
        .map(|(_, _, role)| *role)
}

pub fn is_legal(from: EmployeeStatus, to: EmployeeStatus) -> bool {
    required_role(from, to).is_some()
}
