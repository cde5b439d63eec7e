use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use staffline::lifecycle::{
    Actor, ActorRole, AuditEntry, CompanyLeaveRequest, CompanyLeaveSnapshot, Employee, EmployeeId,
    EmployeeRecord, EmployeeRepository, EmployeeStatus, IdentityResolver, ItLeaveSnapshot,
    LeaveHistory, LeaveRequestId, Notification, NotificationPublisher, PublishError,
    RepositoryError, RequestChange, TransitionCommit,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Store {
    employees: HashMap<EmployeeId, EmployeeRecord>,
    requests: HashMap<LeaveRequestId, CompanyLeaveRequest>,
    company_leaves: Vec<CompanyLeaveSnapshot>,
    it_leaves: Vec<ItLeaveSnapshot>,
    audits: Vec<AuditEntry>,
}

/// In-memory employee store backing the service until a relational adapter
/// lands. Honors the commit contract: version compare-and-swap, one
/// unresolved request per employee, and atomic satellite writes.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEmployeeRepository {
    store: Arc<Mutex<Store>>,
}

impl EmployeeRepository for InMemoryEmployeeRepository {
    fn insert(
        &self,
        employee: Employee,
        audit: AuditEntry,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        if store.employees.contains_key(&employee.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = EmployeeRecord {
            employee,
            version: 1,
        };
        store
            .employees
            .insert(record.employee.id.clone(), record.clone());
        store.audits.push(audit);
        Ok(record)
    }

    fn fetch(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.employees.get(id).cloned())
    }

    fn commit(
        &self,
        commit: TransitionCommit,
    ) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
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
        let mut store = self.store.lock().expect("repository mutex poisoned");
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
        let store = self.store.lock().expect("repository mutex poisoned");
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
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.requests.get(id).cloned())
    }

    fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
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
        let store = self.store.lock().expect("repository mutex poisoned");
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
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store
            .audits
            .iter()
            .filter(|entry| entry.employee_id == *id)
            .cloned()
            .collect())
    }
}

/// Notification sink that retains events for the demo output and the future
/// delivery worker to drain.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), PublishError> {
        let mut events = self.events.lock().expect("notification mutex poisoned");
        events.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Static token table standing in for the excluded authentication layer.
pub(crate) struct StaticTokenResolver {
    tokens: HashMap<String, Actor>,
}

impl Default for StaticTokenResolver {
    fn default() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(
            "admin-token".to_string(),
            Actor::new("operations-admin", ActorRole::Admin),
        );
        tokens.insert(
            "staff-token".to_string(),
            Actor::new("operations-staff", ActorRole::Staff),
        );
        Self { tokens }
    }
}

impl IdentityResolver for StaticTokenResolver {
    fn resolve(&self, token: &str) -> Actor {
        self.tokens
            .get(token)
            .cloned()
            .unwrap_or_else(|| Actor::new("anonymous", ActorRole::Guest))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
