use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::approval::CompanyLeaveRequest;
use super::domain::{CompanyLeaveKind, Employee, EmployeeId, LeaveRequestId};
use super::events::AuditEntry;

/// Versioned employee row. The version is read at load time and checked again
/// at commit time, so two racing transitions can never both apply against the
/// same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee: Employee,
    pub version: u64,
}

/// Terminal company-leave row. Denormalizes the employee fields because the
/// live record is retired once the leave is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLeaveSnapshot {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub kind: CompanyLeaveKind,
    pub leave_date: NaiveDate,
    pub preserved_hours: u32,
    pub approved_by: String,
    pub recorded_on: NaiveDate,
}

/// Medical-leave row written when an IT leave starts. No approval phase, but
/// the snapshot still survives later reactivation or removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItLeaveSnapshot {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub preserved_hours: u32,
    pub started_on: NaiveDate,
}

/// Request mutation folded into an atomic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestChange {
    /// Store a new pending request. Fails with [`RepositoryError::Conflict`]
    /// when an unresolved request already exists for the same employee.
    Open(CompanyLeaveRequest),
    /// Store the terminal form of a request, replacing a pending row when one
    /// exists. Also covers the force-skip path where no pending row was ever
    /// written.
    Settle(CompanyLeaveRequest),
}

/// Unit of work applied against one employee. Everything in here commits
/// together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommit {
    /// The mutated employee, carrying the version observed at load time.
    pub employee: EmployeeRecord,
    pub request: Option<RequestChange>,
    pub company_leave: Option<CompanyLeaveSnapshot>,
    pub it_leave: Option<ItLeaveSnapshot>,
    pub audit: AuditEntry,
    /// Remove the live employee row after writing the satellites (terminal
    /// company-leave approval).
    pub retire_employee: bool,
}

impl TransitionCommit {
    pub(crate) fn of(employee: EmployeeRecord, audit: AuditEntry) -> Self {
        Self {
            employee,
            request: None,
            company_leave: None,
            it_leave: None,
            audit,
            retire_employee: false,
        }
    }
}

/// Leave snapshots accumulated for one employee identifier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeaveHistory {
    pub company: Vec<CompanyLeaveSnapshot>,
    pub it: Vec<ItLeaveSnapshot>,
}

/// Storage abstraction so the executor can be exercised in isolation.
///
/// Contract for [`commit`](Self::commit): the stored version for the
/// employee must equal `commit.employee.version` (otherwise `Conflict`), the
/// request change and satellite rows apply in the same atomic unit, the audit
/// entry is always appended, and the returned record carries the bumped
/// version (`None` when the row was retired).
///
/// Contract for [`adopt_identity`](Self::adopt_identity): atomically remove
/// the placeholder row and insert `commit.employee` under its new identifier.
/// `NotFound` when the placeholder is gone, `Conflict` when the new
/// identifier already belongs to a live employee or the placeholder row
/// changed since it was loaded. The new row starts a fresh version history.
pub trait EmployeeRepository: Send + Sync {
    fn insert(&self, employee: Employee, audit: AuditEntry)
        -> Result<EmployeeRecord, RepositoryError>;
    fn fetch(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError>;
    fn commit(&self, commit: TransitionCommit)
        -> Result<Option<EmployeeRecord>, RepositoryError>;
    fn adopt_identity(
        &self,
        placeholder: &EmployeeId,
        commit: TransitionCommit,
    ) -> Result<EmployeeRecord, RepositoryError>;
    fn penalized(&self) -> Result<Vec<EmployeeRecord>, RepositoryError>;
    fn fetch_request(
        &self,
        id: &LeaveRequestId,
    ) -> Result<Option<CompanyLeaveRequest>, RepositoryError>;
    fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, RepositoryError>;
    fn leave_history(&self, id: &EmployeeId) -> Result<LeaveHistory, RepositoryError>;
    fn audit_trail(&self, id: &EmployeeId) -> Result<Vec<AuditEntry>, RepositoryError>;
}

/// Error enumeration for repository failures. Version mismatches surface as
/// `Conflict`: the caller reloads and retries the whole transition.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
