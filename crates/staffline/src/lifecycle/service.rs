use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::approval::{CompanyLeaveRequest, LeaveDecision};
use super::domain::{
    Actor, ActorRole, CompanyLeaveKind, Employee, EmployeeId, EmployeeState, EmployeeStatus,
    EmployeeView, LeaveRequestId, NewEmployee,
};
use super::events::{AuditEntry, Notification, NotificationPublisher};
use super::expiry::{self, ExpiringPenalization};
use super::repository::{
    CompanyLeaveSnapshot, EmployeeRecord, EmployeeRepository, ItLeaveSnapshot, LeaveHistory,
    RepositoryError, RequestChange, TransitionCommit,
};
use super::{hours, identity, registry};

/// Audit attribution for reactivations driven by the expiry sweep rather
/// than a human actor.
const SWEEP_ACTOR: &str = "penalization-monitor";

/// The single choke point for every employee state change. Validates the
/// edge, checks the privilege floor, applies the hours ledger, and commits
/// the mutation together with its satellite rows and audit entry.
pub struct EmployeeLifecycleService<R, P> {
    repository: Arc<R>,
    notifications: Arc<P>,
}

/// Caller intent for a state change on one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum TransitionRequest {
    ItLeave,
    Penalize {
        ends_on: NaiveDate,
    },
    PendingLaboral,
    Reactivate,
    CompanyLeave {
        kind: CompanyLeaveKind,
        leave_date: NaiveDate,
        #[serde(default)]
        skip_approval: bool,
    },
}

/// What a transition produced: a direct mutation, a pending approval, or a
/// terminal archive of the employee record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Applied { employee: EmployeeView },
    AwaitingApproval { request: CompanyLeaveRequest },
    Archived { employee: EmployeeView },
}

impl<R, P> EmployeeLifecycleService<R, P>
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<P>) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    /// Register a new hire. A final external ID yields an active employee;
    /// without one, a top-privilege actor gets a placeholder identifier and
    /// the record waits in `pendiente_activacion`.
    pub fn onboard(
        &self,
        intake: NewEmployee,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<EmployeeRecord, LifecycleError> {
        let (id, state) = match &intake.external_id {
            Some(external) => {
                if !actor.role.covers(ActorRole::Staff) {
                    return Err(LifecycleError::Forbidden {
                        required: ActorRole::Staff,
                    });
                }
                (EmployeeId(external.clone()), EmployeeState::Active)
            }
            None => {
                if !actor.role.covers(ActorRole::Admin) {
                    return Err(LifecycleError::Forbidden {
                        required: ActorRole::Admin,
                    });
                }
                (identity::allocate(), EmployeeState::PendienteActivacion)
            }
        };

        let employee = Employee {
            id: id.clone(),
            full_name: intake.full_name,
            email: intake.email,
            phone: intake.phone,
            assigned_hours: intake.assigned_hours,
            state,
            hired_on: intake.hired_on,
            updated_on: today,
        };
        let audit = AuditEntry::record(
            actor,
            "onboard",
            id.clone(),
            format!("onboarded in status {}", employee.status()),
            today,
        );

        let stored = self.repository.insert(employee, audit)?;
        info!(employee = %id, status = %stored.employee.status(), "employee onboarded");
        Ok(stored)
    }

    pub fn get(&self, id: &EmployeeId) -> Result<EmployeeRecord, LifecycleError> {
        self.load(id)
    }

    /// Apply a state change. Company-leave requests route through the
    /// approval workflow unless a top-privilege actor skips it; everything
    /// else commits directly.
    pub fn apply_transition(
        &self,
        id: &EmployeeId,
        request: TransitionRequest,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<TransitionOutcome, LifecycleError> {
        match request {
            TransitionRequest::CompanyLeave {
                kind,
                leave_date,
                skip_approval: false,
            } => {
                let request = self.propose_company_leave(id, kind, leave_date, actor, today)?;
                Ok(TransitionOutcome::AwaitingApproval { request })
            }
            TransitionRequest::CompanyLeave {
                kind,
                leave_date,
                skip_approval: true,
            } => {
                let employee = self.force_company_leave(id, kind, leave_date, actor, today)?;
                Ok(TransitionOutcome::Archived { employee })
            }
            direct => {
                let stored = self.apply_direct(id, direct, actor, today)?;
                Ok(TransitionOutcome::Applied {
                    employee: stored.employee.status_view(),
                })
            }
        }
    }

    fn apply_direct(
        &self,
        id: &EmployeeId,
        request: TransitionRequest,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<EmployeeRecord, LifecycleError> {
        let mut record = self.load(id)?;
        let from = record.employee.status();

        let target = match &request {
            TransitionRequest::ItLeave => EmployeeStatus::ItLeave,
            TransitionRequest::Penalize { .. } => EmployeeStatus::Penalizado,
            TransitionRequest::PendingLaboral => EmployeeStatus::PendingLaboral,
            TransitionRequest::Reactivate => EmployeeStatus::Active,
            TransitionRequest::CompanyLeave { .. } => unreachable!("routed via approval workflow"),
        };

        // Activation of a placeholder needs the final identifier and goes
        // through resolve_identity, not a plain reactivation.
        if from == EmployeeStatus::PendienteActivacion {
            return Err(LifecycleError::InvalidTransition { from, to: target });
        }
        // The pending -> active edge belongs to the approval workflow; a
        // direct reactivation would leave the unresolved request dangling.
        if from == EmployeeStatus::CompanyLeavePending {
            return Err(LifecycleError::InvalidTransition { from, to: target });
        }

        self.authorize(from, target, actor)?;

        let mut it_leave = None;
        let action: &'static str;
        let details: String;
        match request {
            TransitionRequest::ItLeave => {
                let banked = hours::zero_and_preserve(&mut record.employee);
                record.employee.state = EmployeeState::ItLeave {
                    preserved_hours: banked,
                };
                it_leave = Some(ItLeaveSnapshot {
                    employee_id: record.employee.id.clone(),
                    full_name: record.employee.full_name.clone(),
                    preserved_hours: banked,
                    started_on: today,
                });
                action = "it_leave";
                details = format!("medical leave started, {banked} hours preserved");
            }
            TransitionRequest::Penalize { ends_on } => {
                let banked = hours::zero_and_preserve(&mut record.employee);
                record.employee.state = EmployeeState::Penalizado {
                    ends_on,
                    preserved_hours: banked,
                };
                action = "penalize";
                details = format!("penalized until {ends_on}, {banked} hours preserved");
            }
            TransitionRequest::PendingLaboral => {
                record.employee.state = EmployeeState::PendingLaboral;
                action = "pending_laboral";
                details = "moved to pending laboral".to_string();
            }
            TransitionRequest::Reactivate => {
                hours::restore(&mut record.employee);
                record.employee.state = EmployeeState::Active;
                action = "reactivate";
                details = format!(
                    "reactivated with {} hours restored",
                    record.employee.assigned_hours
                );
            }
            TransitionRequest::CompanyLeave { .. } => unreachable!("routed via approval workflow"),
        }
        record.employee.updated_on = today;

        let audit = AuditEntry::record(actor, action, record.employee.id.clone(), details, today);
        let mut commit = TransitionCommit::of(record, audit);
        commit.it_leave = it_leave;

        let stored = self
            .repository
            .commit(commit)?
            .ok_or(RepositoryError::Conflict)?;
        info!(employee = %id, from = %from, to = %target, "transition applied");
        Ok(stored)
    }

    /// Open a pending company-leave request: the employee parks in
    /// `company_leave_pending` with hours banked until a top-privilege actor
    /// resolves the request. At most one unresolved request may exist per
    /// employee; the repository enforces that inside the same atomic commit.
    pub fn propose_company_leave(
        &self,
        id: &EmployeeId,
        kind: CompanyLeaveKind,
        leave_date: NaiveDate,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<CompanyLeaveRequest, LifecycleError> {
        let mut record = self.load(id)?;
        // An unresolved request already parks the employee here; that is a
        // uniqueness conflict, not an illegal edge.
        if matches!(
            record.employee.state,
            EmployeeState::CompanyLeavePending { .. }
        ) {
            return Err(RepositoryError::Conflict.into());
        }
        let from = record.employee.status();
        self.authorize(from, EmployeeStatus::CompanyLeavePending, actor)?;

        let request = CompanyLeaveRequest::open(id.clone(), kind, leave_date, actor);
        let banked = hours::zero_and_preserve(&mut record.employee);
        record.employee.state = EmployeeState::CompanyLeavePending {
            request_id: request.id.clone(),
            preserved_hours: banked,
        };
        record.employee.updated_on = today;

        let audit = AuditEntry::record(
            actor,
            "company_leave_requested",
            id.clone(),
            format!("{} leave proposed for {leave_date}", kind.label()),
            today,
        );
        let mut commit = TransitionCommit::of(record, audit);
        commit.request = Some(RequestChange::Open(request.clone()));

        self.repository.commit(commit)?;
        self.notify(Notification::pending_request(&request));
        info!(employee = %id, request = %request.id, kind = kind.label(), "company leave requested");
        Ok(request)
    }

    /// Settle a pending request. Approval archives the employee behind a
    /// terminal snapshot; rejection reinstates them with hours restored.
    /// Either way the request becomes immutable history, so a second call
    /// returns `AlreadyResolved` without touching any state.
    pub fn resolve_company_leave(
        &self,
        request_id: &LeaveRequestId,
        decision: LeaveDecision,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<CompanyLeaveRequest, LifecycleError> {
        if !actor.role.covers(ActorRole::Admin) {
            return Err(LifecycleError::Forbidden {
                required: ActorRole::Admin,
            });
        }

        let request = self
            .repository
            .fetch_request(request_id)?
            .ok_or(RepositoryError::NotFound)?;
        if !request.is_pending() {
            return Err(LifecycleError::AlreadyResolved);
        }

        let mut record = self.load(&request.employee_id)?;
        let banked = match &record.employee.state {
            EmployeeState::CompanyLeavePending {
                request_id: held,
                preserved_hours,
            } if *held == request.id => *preserved_hours,
            // The employee moved on since the request was loaded; reload and retry.
            _ => return Err(RepositoryError::Conflict.into()),
        };

        let resolved = request.resolved(decision, actor, today);
        let commit = match decision {
            LeaveDecision::Approve => {
                record.employee.state = EmployeeState::CompanyLeaveApproved {
                    preserved_hours: banked,
                };
                record.employee.updated_on = today;
                let snapshot = company_snapshot(&record.employee, &resolved, today);
                let audit = AuditEntry::record(
                    actor,
                    "company_leave_approved",
                    record.employee.id.clone(),
                    format!("{} leave approved, record archived", resolved.kind.label()),
                    today,
                );
                let mut commit = TransitionCommit::of(record, audit);
                commit.request = Some(RequestChange::Settle(resolved.clone()));
                commit.company_leave = Some(snapshot);
                commit.retire_employee = true;
                commit
            }
            LeaveDecision::Reject => {
                hours::restore(&mut record.employee);
                record.employee.state = EmployeeState::Active;
                record.employee.updated_on = today;
                let audit = AuditEntry::record(
                    actor,
                    "company_leave_rejected",
                    record.employee.id.clone(),
                    format!(
                        "{} leave rejected, {} hours restored",
                        resolved.kind.label(),
                        record.employee.assigned_hours
                    ),
                    today,
                );
                let mut commit = TransitionCommit::of(record, audit);
                commit.request = Some(RequestChange::Settle(resolved.clone()));
                commit
            }
        };

        self.repository.commit(commit)?;
        self.notify(Notification::request_resolved(&resolved, decision));
        info!(request = %resolved.id, status = resolved.status.label(), "company leave resolved");
        Ok(resolved)
    }

    fn force_company_leave(
        &self,
        id: &EmployeeId,
        kind: CompanyLeaveKind,
        leave_date: NaiveDate,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<EmployeeView, LifecycleError> {
        let mut record = self.load(id)?;
        if matches!(
            record.employee.state,
            EmployeeState::CompanyLeavePending { .. }
        ) {
            return Err(RepositoryError::Conflict.into());
        }
        let from = record.employee.status();
        self.authorize(from, EmployeeStatus::CompanyLeavePending, actor)?;
        // Skipping the pending phase means exercising the approval edge too,
        // so only the approver's privilege level qualifies.
        self.authorize(
            EmployeeStatus::CompanyLeavePending,
            EmployeeStatus::CompanyLeaveApproved,
            actor,
        )?;

        let banked = hours::zero_and_preserve(&mut record.employee);
        let request = CompanyLeaveRequest::open(id.clone(), kind, leave_date, actor).resolved(
            LeaveDecision::Approve,
            actor,
            today,
        );
        record.employee.state = EmployeeState::CompanyLeaveApproved {
            preserved_hours: banked,
        };
        record.employee.updated_on = today;
        let view = record.employee.status_view();
        let snapshot = company_snapshot(&record.employee, &request, today);

        let audit = AuditEntry::record(
            actor,
            "company_leave_approved",
            id.clone(),
            format!("{} leave finalized without approval phase", kind.label()),
            today,
        );
        let mut commit = TransitionCommit::of(record, audit);
        commit.request = Some(RequestChange::Settle(request.clone()));
        commit.company_leave = Some(snapshot);
        commit.retire_employee = true;

        self.repository.commit(commit)?;
        self.notify(Notification::request_resolved(&request, LeaveDecision::Approve));
        info!(employee = %id, kind = kind.label(), "company leave finalized directly");
        Ok(view)
    }

    /// Swap a placeholder identifier for the final external one. The old row
    /// retires and the new one is created active in a single atomic
    /// operation, so no window exists with zero or two live records for the
    /// same person.
    pub fn resolve_identity(
        &self,
        placeholder: &EmployeeId,
        final_id: EmployeeId,
        actor: &Actor,
        today: NaiveDate,
    ) -> Result<EmployeeRecord, LifecycleError> {
        let record = self.load(placeholder)?;
        let from = record.employee.status();
        if from != EmployeeStatus::PendienteActivacion {
            return Err(LifecycleError::InvalidTransition {
                from,
                to: EmployeeStatus::Active,
            });
        }
        self.authorize(from, EmployeeStatus::Active, actor)?;

        let version = record.version;
        let mut employee = record.employee;
        employee.id = final_id;
        employee.state = EmployeeState::Active;
        employee.updated_on = today;

        let audit = AuditEntry::record(
            actor,
            "activate",
            employee.id.clone(),
            format!("placeholder {placeholder} resolved to final identifier"),
            today,
        );
        let commit = TransitionCommit::of(EmployeeRecord { employee, version }, audit);

        let stored = self.repository.adopt_identity(placeholder, commit)?;
        self.notify(Notification::activation(&stored.employee, placeholder));
        info!(placeholder = %placeholder, employee = %stored.employee.id, "identity resolved");
        Ok(stored)
    }

    /// Penalizations ending within the window, soonest first. Drives the
    /// proactive-alert decision; delivery belongs to the excluded layers.
    pub fn expiring_within(
        &self,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<ExpiringPenalization>, LifecycleError> {
        let records = self.repository.penalized()?;
        Ok(expiry::expiring_within(
            records.iter().map(|record| &record.employee),
            days,
            today,
        ))
    }

    /// Reactivate every employee whose penalization has run out, restoring
    /// their banked hours. Invoked on demand by an external scheduler;
    /// running it again with no time advanced finds nothing left to do.
    pub fn sweep_expired(&self, today: NaiveDate) -> Result<Vec<EmployeeView>, LifecycleError> {
        let actor = Actor::new(SWEEP_ACTOR, ActorRole::Admin);
        let mut reactivated = Vec::new();

        for mut record in self.repository.penalized()? {
            if !expiry::is_expired(&record.employee, today) {
                continue;
            }
            let ended_on = match record.employee.state.penalization_end() {
                Some(date) => date,
                None => continue,
            };

            hours::restore(&mut record.employee);
            record.employee.state = EmployeeState::Active;
            record.employee.updated_on = today;

            let audit = AuditEntry::record(
                &actor,
                "penalization_expired",
                record.employee.id.clone(),
                format!("penalization ended {ended_on}, employee reactivated"),
                today,
            );
            let employee = record.employee.clone();
            self.repository.commit(TransitionCommit::of(record, audit))?;
            self.notify(Notification::penalization_expired(&employee, ended_on));
            reactivated.push(employee.status_view());
        }

        if !reactivated.is_empty() {
            info!(count = reactivated.len(), "expired penalizations swept");
        }
        Ok(reactivated)
    }

    pub fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, LifecycleError> {
        Ok(self.repository.pending_requests()?)
    }

    pub fn leave_history(&self, id: &EmployeeId) -> Result<LeaveHistory, LifecycleError> {
        Ok(self.repository.leave_history(id)?)
    }

    pub fn audit_trail(&self, id: &EmployeeId) -> Result<Vec<AuditEntry>, LifecycleError> {
        Ok(self.repository.audit_trail(id)?)
    }

    fn load(&self, id: &EmployeeId) -> Result<EmployeeRecord, LifecycleError> {
        Ok(self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    fn authorize(
        &self,
        from: EmployeeStatus,
        to: EmployeeStatus,
        actor: &Actor,
    ) -> Result<(), LifecycleError> {
        let required = registry::required_role(from, to)
            .ok_or(LifecycleError::InvalidTransition { from, to })?;
        if !actor.role.covers(required) {
            return Err(LifecycleError::Forbidden { required });
        }
        Ok(())
    }

    /// Notifications are fire-and-forget: the transition is already
    /// committed, so a delivery failure is logged and swallowed.
    fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifications.publish(notification) {
            warn!(%err, "notification delivery failed");
        }
    }
}

fn company_snapshot(
    employee: &Employee,
    request: &CompanyLeaveRequest,
    today: NaiveDate,
) -> CompanyLeaveSnapshot {
    CompanyLeaveSnapshot {
        employee_id: employee.id.clone(),
        full_name: employee.full_name.clone(),
        email: employee.email.clone(),
        phone: employee.phone.clone(),
        kind: request.kind,
        leave_date: request.leave_date,
        preserved_hours: employee.state.preserved_hours().unwrap_or(0),
        approved_by: request.resolved_by.clone().unwrap_or_default(),
        recorded_on: today,
    }
}

/// Error raised by the lifecycle executor. Not-found and conflict conditions
/// surface through the transparent repository variant.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("transition from {from} to {to} is not allowed")]
    InvalidTransition {
        from: EmployeeStatus,
        to: EmployeeStatus,
    },
    #[error("action requires {required} privilege")]
    Forbidden { required: ActorRole },
    #[error("request already resolved")]
    AlreadyResolved,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
