//! Events a committed transition hands to the excluded delivery layer.
//! Notifications are fire-and-forget from the core's perspective; audit
//! entries are persisted inside the same commit as the mutation they record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::approval::{CompanyLeaveRequest, LeaveDecision};
use super::domain::{Actor, Employee, EmployeeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CompanyLeaveRequest,
    Activation,
    PenalizationExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
}

/// Audit-visible record of a decision the delivery layer should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub status: NotificationStatus,
    pub employee_id: Option<EmployeeId>,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
}

impl Notification {
    pub(crate) fn pending_request(request: &CompanyLeaveRequest) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("request_id".to_string(), request.id.0.clone());
        metadata.insert("leave_kind".to_string(), request.kind.label().to_string());
        metadata.insert("leave_date".to_string(), request.leave_date.to_string());

        Self {
            kind: NotificationKind::CompanyLeaveRequest,
            status: NotificationStatus::Pending,
            employee_id: Some(request.employee_id.clone()),
            message: format!(
                "{} requested a {} leave for {}",
                request.requested_by,
                request.kind.label(),
                request.employee_id
            ),
            metadata,
        }
    }

    pub(crate) fn request_resolved(request: &CompanyLeaveRequest, decision: LeaveDecision) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("request_id".to_string(), request.id.0.clone());
        let (status, verdict) = match decision {
            LeaveDecision::Approve => (NotificationStatus::Processed, "approved"),
            LeaveDecision::Reject => (NotificationStatus::Rejected, "rejected"),
        };
        metadata.insert("decision".to_string(), verdict.to_string());

        Self {
            kind: NotificationKind::CompanyLeaveRequest,
            status,
            employee_id: Some(request.employee_id.clone()),
            message: format!(
                "{} leave request {} for {} was {verdict}",
                request.kind.label(),
                request.id,
                request.employee_id
            ),
            metadata,
        }
    }

    pub(crate) fn activation(employee: &Employee, former_id: &EmployeeId) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("former_id".to_string(), former_id.0.clone());

        Self {
            kind: NotificationKind::Activation,
            status: NotificationStatus::Processed,
            employee_id: Some(employee.id.clone()),
            message: format!(
                "{} activated under final identifier {}",
                employee.full_name, employee.id
            ),
            metadata,
        }
    }

    pub(crate) fn penalization_expired(employee: &Employee, ended_on: NaiveDate) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("ended_on".to_string(), ended_on.to_string());

        Self {
            kind: NotificationKind::PenalizationExpired,
            status: NotificationStatus::Processed,
            employee_id: Some(employee.id.clone()),
            message: format!(
                "penalization for {} ended on {ended_on}; employee reactivated",
                employee.id
            ),
            metadata,
        }
    }
}

/// One line of history per committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub actor: String,
    pub action: &'static str,
    pub employee_id: EmployeeId,
    pub details: String,
    pub occurred_on: NaiveDate,
}

impl AuditEntry {
    pub(crate) fn record(
        actor: &Actor,
        action: &'static str,
        employee_id: EmployeeId,
        details: String,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            actor: actor.id.clone(),
            action,
            employee_id,
            details,
            occurred_on,
        }
    }
}

/// Trait describing the outbound notification hook (UI inbox, messaging
/// adapters). Implementations must tolerate duplicate delivery.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), PublishError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
