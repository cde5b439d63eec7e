use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::lifecycle::approval::CompanyLeaveRequest;
use crate::lifecycle::domain::{
    Actor, ActorRole, Employee, EmployeeId, EmployeeStatus, IdentityResolver, LeaveRequestId,
    NewEmployee,
};
use crate::lifecycle::events::{AuditEntry, Notification, NotificationPublisher, PublishError};
use crate::lifecycle::repository::{
    CompanyLeaveSnapshot, EmployeeRecord, EmployeeRepository, ItLeaveSnapshot, LeaveHistory,
    RepositoryError, RequestChange, TransitionCommit,
};
use crate::lifecycle::router::LifecycleApi;
use crate::lifecycle::service::EmployeeLifecycleService;

pub(super) fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, dom).expect("valid date")
}

pub(super) fn admin() -> Actor {
    Actor::new("root", ActorRole::Admin)
}

pub(super) fn staff() -> Actor {
    Actor::new("coordinator", ActorRole::Staff)
}

pub(super) fn guest() -> Actor {
    Actor::new("visitor", ActorRole::Guest)
}

pub(super) fn intake(external_id: Option<&str>, assigned_hours: u32) -> NewEmployee {
    NewEmployee {
        external_id: external_id.map(str::to_string),
        full_name: "Lucia Fernandez".to_string(),
        email: Some("lucia@example.com".to_string()),
        phone: Some("+34 600 000 001".to_string()),
        assigned_hours,
        hired_on: day(2025, 1, 7),
    }
}

pub(super) type TestService = EmployeeLifecycleService<MemoryRepository, MemoryNotifications>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = Arc::new(EmployeeLifecycleService::new(
        repository.clone(),
        notifications.clone(),
    ));
    (service, repository, notifications)
}

pub(super) fn build_api() -> (
    LifecycleApi<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let (service, repository, notifications) = build_service();
    let api = LifecycleApi {
        service,
        identity: Arc::new(TokenTable),
        expiry_warning_days: 7,
    };
    (api, repository, notifications)
}

/// Onboard an active employee under `external_id` with the given allocation.
pub(super) fn onboard_active(
    service: &TestService,
    external_id: &str,
    assigned_hours: u32,
) -> EmployeeRecord {
    service
        .onboard(intake(Some(external_id), assigned_hours), &staff(), day(2025, 1, 7))
        .expect("onboarding succeeds")
}

/// Token table standing in for the excluded authentication layer.
pub(super) struct TokenTable;

impl IdentityResolver for TokenTable {
    fn resolve(&self, token: &str) -> Actor {
        match token {
            "root-token" => Actor::new("root", ActorRole::Admin),
            "staff-token" => Actor::new("coordinator", ActorRole::Staff),
            _ => Actor::new("anonymous", ActorRole::Guest),
        }
    }
}

#[derive(Default)]
struct Store {
    employees: HashMap<EmployeeId, EmployeeRecord>,
    requests: HashMap<LeaveRequestId, CompanyLeaveRequest>,
    company_leaves: Vec<CompanyLeaveSnapshot>,
    it_leaves: Vec<ItLeaveSnapshot>,
    audits: Vec<AuditEntry>,
}

/// In-memory repository honoring the full commit contract: version CAS,
/// single-unresolved-request enforcement, and atomic satellite writes.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepository {
    pub(super) fn company_leaves(&self) -> Vec<CompanyLeaveSnapshot> {
        self.store.lock().expect("store mutex").company_leaves.clone()
    }

    pub(super) fn it_leaves(&self) -> Vec<ItLeaveSnapshot> {
        self.store.lock().expect("store mutex").it_leaves.clone()
    }

    pub(super) fn audits(&self) -> Vec<AuditEntry> {
        self.store.lock().expect("store mutex").audits.clone()
    }

    pub(super) fn live_ids(&self) -> Vec<EmployeeId> {
        let mut ids: Vec<EmployeeId> = self
            .store
            .lock()
            .expect("store mutex")
            .employees
            .keys()
            .cloned()
            .collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }
}

impl EmployeeRepository for MemoryRepository {
    fn insert(
        &self,
        employee: Employee,
        audit: AuditEntry,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex");
        if store.employees.contains_key(&employee.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = EmployeeRecord {
            employee,
            version: 1,
        };
        store.employees.insert(record.employee.id.clone(), record.clone());
        store.audits.push(audit);
        Ok(record)
    }

    fn fetch(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        Ok(store.employees.get(id).cloned())
    }

    fn commit(
        &self,
        commit: TransitionCommit,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex");
        let id = commit.employee.employee.id.clone();
        let stored_version = store
            .employees
            .get(&id)
            .map(|record| record.version)
            .ok_or(RepositoryError::NotFound)?;
        if stored_version != commit.employee.version {
            return Err(RepositoryError::Conflict);
        }
        if let Some(RequestChange::Open(_)) = &commit.request {
            let unresolved = store
                .requests
                .values()
                .any(|request| request.employee_id == id && request.is_pending());
            if unresolved {
                return Err(RepositoryError::Conflict);
            }
        }

        match commit.request {
            Some(RequestChange::Open(request)) | Some(RequestChange::Settle(request)) => {
                store.requests.insert(request.id.clone(), request);
            }
            None => {}
        }
        if let Some(snapshot) = commit.company_leave {
            store.company_leaves.push(snapshot);
        }
        if let Some(snapshot) = commit.it_leave {
            store.it_leaves.push(snapshot);
        }
        store.audits.push(commit.audit);

        if commit.retire_employee {
            store.employees.remove(&id);
            return Ok(None);
        }
        let next = EmployeeRecord {
            employee: commit.employee.employee,
            version: stored_version + 1,
        };
        store.employees.insert(id, next.clone());
        Ok(Some(next))
    }

    fn adopt_identity(
        &self,
        placeholder: &EmployeeId,
        commit: TransitionCommit,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let mut store = self.store.lock().expect("store mutex");
        let stored_version = store
            .employees
            .get(placeholder)
            .map(|record| record.version)
            .ok_or(RepositoryError::NotFound)?;
        if stored_version != commit.employee.version {
            return Err(RepositoryError::Conflict);
        }
        let new_id = commit.employee.employee.id.clone();
        if new_id != *placeholder && store.employees.contains_key(&new_id) {
            return Err(RepositoryError::Conflict);
        }

        store.employees.remove(placeholder);
        let record = EmployeeRecord {
            employee: commit.employee.employee,
            version: 1,
        };
        store.employees.insert(new_id, record.clone());
        store.audits.push(commit.audit);
        Ok(record)
    }

    fn penalized(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        let mut records: Vec<EmployeeRecord> = store
            .employees
            .values()
            .filter(|record| record.employee.status() == EmployeeStatus::Penalizado)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.employee.id.0.cmp(&b.employee.id.0));
        Ok(records)
    }

    fn fetch_request(
        &self,
        id: &LeaveRequestId,
    ) -> Result<Option<CompanyLeaveRequest>, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        Ok(store.requests.get(id).cloned())
    }

    fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        let mut pending: Vec<CompanyLeaveRequest> = store
            .requests
            .values()
            .filter(|request| request.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(pending)
    }

    fn leave_history(&self, id: &EmployeeId) -> Result<LeaveHistory, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        Ok(LeaveHistory {
            company: store
                .company_leaves
                .iter()
                .filter(|snapshot| snapshot.employee_id == *id)
                .cloned()
                .collect(),
            it: store
                .it_leaves
                .iter()
                .filter(|snapshot| snapshot.employee_id == *id)
                .cloned()
                .collect(),
        })
    }

    fn audit_trail(&self, id: &EmployeeId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let store = self.store.lock().expect("store mutex");
        Ok(store
            .audits
            .iter()
            .filter(|entry| entry.employee_id == *id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), PublishError> {
        let mut events = self.events.lock().expect("events mutex");
        events.push(notification);
        Ok(())
    }
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("events mutex").clone()
    }
}

/// Publisher that always fails, for exercising fire-and-forget delivery.
#[derive(Default, Clone)]
pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), PublishError> {
        Err(PublishError::Transport("inbox offline".to_string()))
    }
}

/// Repository stand-in for a persistence outage.
pub(super) struct UnavailableRepository;

impl UnavailableRepository {
    fn outage<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl EmployeeRepository for UnavailableRepository {
    fn insert(
        &self,
        _employee: Employee,
        _audit: AuditEntry,
    ) -> Result<EmployeeRecord, RepositoryError> {
        Self::outage()
    }

    fn fetch(&self, _id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
        Self::outage()
    }

    fn commit(
        &self,
        _commit: TransitionCommit,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        Self::outage()
    }

    fn adopt_identity(
        &self,
        _placeholder: &EmployeeId,
        _commit: TransitionCommit,
    ) -> Result<EmployeeRecord, RepositoryError> {
        Self::outage()
    }

    fn penalized(&self) -> Result<Vec<EmployeeRecord>, RepositoryError> {
        Self::outage()
    }

    fn fetch_request(
        &self,
        _id: &LeaveRequestId,
    ) -> Result<Option<CompanyLeaveRequest>, RepositoryError> {
        Self::outage()
    }

    fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, RepositoryError> {
        Self::outage()
    }

    fn leave_history(&self, _id: &EmployeeId) -> Result<LeaveHistory, RepositoryError> {
        Self::outage()
    }

    fn audit_trail(&self, _id: &EmployeeId) -> Result<Vec<AuditEntry>, RepositoryError> {
        Self::outage()
    }
}
