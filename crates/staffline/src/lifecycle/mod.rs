//! Employee status state machine and its consistency-preserving side
//! effects.
//!
//! Every state change flows through [`EmployeeLifecycleService`]: it consults
//! the transition graph for legality, applies the privilege floor once per
//! edge, keeps the working-hours ledger balanced across leaves, routes
//! company leaves through the two-phase approval workflow, and commits each
//! mutation atomically together with its satellite rows and audit entry.

pub mod approval;
pub mod domain;
pub mod events;
pub mod identity;
pub mod registry;
pub mod repository;
pub mod router;
pub mod service;

pub(crate) mod expiry;
pub(crate) mod hours;

#[cfg(test)]
mod tests;

pub use approval::{CompanyLeaveRequest, LeaveDecision, RequestStatus};
pub use domain::{
    Actor, ActorRole, CompanyLeaveKind, Employee, EmployeeId, EmployeeState, EmployeeStatus,
    EmployeeView, IdentityResolver, LeaveRequestId, NewEmployee,
};
pub use events::{
    AuditEntry, Notification, NotificationKind, NotificationPublisher, NotificationStatus,
    PublishError,
};
pub use expiry::ExpiringPenalization;
pub use repository::{
    CompanyLeaveSnapshot, EmployeeRecord, EmployeeRepository, ItLeaveSnapshot, LeaveHistory,
    RepositoryError, RequestChange, TransitionCommit,
};
pub use router::{lifecycle_router, LifecycleApi};
pub use service::{
    EmployeeLifecycleService, LifecycleError, TransitionOutcome, TransitionRequest,
};
