//! Pending workflow records for the two-phase company-leave process. A
//! request moves `pending -> approved | rejected` exactly once; resolved
//! records are immutable history.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Actor, CompanyLeaveKind, EmployeeId, LeaveRequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Verdict a top-privilege actor hands down on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub kind: CompanyLeaveKind,
    pub leave_date: NaiveDate,
    pub requested_by: String,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_on: Option<NaiveDate>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_request_id() -> LeaveRequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaveRequestId(format!("req-{id:06}"))
}

impl CompanyLeaveRequest {
    pub(crate) fn open(
        employee_id: EmployeeId,
        kind: CompanyLeaveKind,
        leave_date: NaiveDate,
        requested_by: &Actor,
    ) -> Self {
        Self {
            id: next_request_id(),
            employee_id,
            kind,
            leave_date,
            requested_by: requested_by.id.clone(),
            status: RequestStatus::Pending,
            resolved_by: None,
            resolved_on: None,
        }
    }

    /// Consume the pending record and produce its terminal form.
    pub(crate) fn resolved(self, decision: LeaveDecision, decided_by: &Actor, on: NaiveDate) -> Self {
        Self {
            status: match decision {
                LeaveDecision::Approve => RequestStatus::Approved,
                LeaveDecision::Reject => RequestStatus::Rejected,
            },
            resolved_by: Some(decided_by.id.clone()),
            resolved_on: Some(on),
            ..self
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
