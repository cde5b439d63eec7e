//! End-to-end specifications for the employee lifecycle executor.
//!
//! Scenarios drive the public service facade the way the HTTP shell does, so
//! transition legality, hours conservation, approval resolution, identity
//! swaps, and the expiry sweep are validated without reaching into private
//! modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use staffline::lifecycle::{
        Actor, ActorRole, AuditEntry, CompanyLeaveRequest, CompanyLeaveSnapshot, Employee,
        EmployeeId, EmployeeLifecycleService, EmployeeRecord, EmployeeRepository, EmployeeStatus,
        ItLeaveSnapshot, LeaveHistory, LeaveRequestId, NewEmployee, Notification,
        NotificationPublisher, PublishError, RepositoryError, RequestChange, TransitionCommit,
    };

    pub fn day(year: i32, month: u32, dom: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, dom).expect("valid date")
    }

    pub fn admin() -> Actor {
        Actor::new("root", ActorRole::Admin)
    }

    pub fn staff() -> Actor {
        Actor::new("coordinator", ActorRole::Staff)
    }

    pub fn intake(external_id: Option<&str>, assigned_hours: u32) -> NewEmployee {
        NewEmployee {
            external_id: external_id.map(str::to_string),
            full_name: "Carmen Vidal".to_string(),
            email: Some("carmen@example.com".to_string()),
            phone: None,
            assigned_hours,
            hired_on: day(2025, 1, 7),
        }
    }

    pub type WorkflowService = EmployeeLifecycleService<MemoryRepository, MemoryNotifications>;

    pub fn build_service() -> (
        Arc<WorkflowService>,
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

    pub fn onboard_active(
        service: &WorkflowService,
        external_id: &str,
        assigned_hours: u32,
    ) -> EmployeeRecord {
        service
            .onboard(
                intake(Some(external_id), assigned_hours),
                &staff(),
                day(2025, 1, 7),
            )
            .expect("onboarding succeeds")
    }

    #[derive(Default)]
    struct Store {
        employees: HashMap<EmployeeId, EmployeeRecord>,
        requests: HashMap<LeaveRequestId, CompanyLeaveRequest>,
        company_leaves: Vec<CompanyLeaveSnapshot>,
        it_leaves: Vec<ItLeaveSnapshot>,
        audits: Vec<AuditEntry>,
    }

    #[derive(Default, Clone)]
    pub struct MemoryRepository {
        store: Arc<Mutex<Store>>,
    }

    impl MemoryRepository {
        pub fn company_leaves(&self) -> Vec<CompanyLeaveSnapshot> {
            self.store.lock().expect("store mutex").company_leaves.clone()
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
            store
                .employees
                .insert(record.employee.id.clone(), record.clone());
            store.audits.push(audit);
            Ok(record)
        }

        fn fetch(&self, id: &EmployeeId) -> Result<Option<EmployeeRecord>, RepositoryError> {
            Ok(self.store.lock().expect("store mutex").employees.get(id).cloned())
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
            Ok(store
                .employees
                .values()
                .filter(|record| record.employee.status() == EmployeeStatus::Penalizado)
                .cloned()
                .collect())
        }

        fn fetch_request(
            &self,
            id: &LeaveRequestId,
        ) -> Result<Option<CompanyLeaveRequest>, RepositoryError> {
            Ok(self.store.lock().expect("store mutex").requests.get(id).cloned())
        }

        fn pending_requests(&self) -> Result<Vec<CompanyLeaveRequest>, RepositoryError> {
            let store = self.store.lock().expect("store mutex");
            Ok(store
                .requests
                .values()
                .filter(|request| request.is_pending())
                .cloned()
                .collect())
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
    pub struct MemoryNotifications {
        events: Arc<Mutex<Vec<Notification>>>,
    }

    impl NotificationPublisher for MemoryNotifications {
        fn publish(&self, notification: Notification) -> Result<(), PublishError> {
            self.events.lock().expect("events mutex").push(notification);
            Ok(())
        }
    }

    impl MemoryNotifications {
        pub fn events(&self) -> Vec<Notification> {
            self.events.lock().expect("events mutex").clone()
        }
    }
}

use common::*;
use staffline::lifecycle::{
    CompanyLeaveKind, EmployeeId, EmployeeRepository, LeaveDecision, LifecycleError,
    NotificationStatus, RepositoryError, TransitionRequest,
};

#[test]
fn company_leave_rejection_round_trip_restores_the_employee() {
    // Scenario: E1 active with 40 assigned hours.
    let (service, repository, notifications) = build_service();
    let record = onboard_active(&service, "E1", 40);

    let request = service
        .propose_company_leave(
            &record.employee.id,
            CompanyLeaveKind::Voluntaria,
            day(2025, 4, 30),
            &staff(),
            day(2025, 4, 1),
        )
        .expect("proposal succeeds");

    let parked = repository
        .fetch(&record.employee.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(parked.employee.status().label(), "company_leave_pending");
    assert_eq!(parked.employee.assigned_hours, 0);
    assert_eq!(parked.employee.state.preserved_hours(), Some(40));

    service
        .resolve_company_leave(&request.id, LeaveDecision::Reject, &admin(), day(2025, 4, 3))
        .expect("rejection succeeds");

    let reinstated = repository
        .fetch(&record.employee.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(reinstated.employee.status().label(), "active");
    assert_eq!(reinstated.employee.assigned_hours, 40);
    assert_eq!(reinstated.employee.state.preserved_hours(), None);

    let statuses: Vec<NotificationStatus> = notifications
        .events()
        .iter()
        .map(|event| event.status)
        .collect();
    assert_eq!(
        statuses,
        vec![NotificationStatus::Pending, NotificationStatus::Rejected]
    );
}

#[test]
fn penalization_expires_only_after_its_end_date() {
    // Scenario: E2 active with 35 hours, penalized until now + 2 days.
    let (service, repository, _) = build_service();
    let record = onboard_active(&service, "E2", 35);
    let now = day(2025, 5, 1);

    service
        .apply_transition(
            &record.employee.id,
            TransitionRequest::Penalize {
                ends_on: now + chrono::Duration::days(2),
            },
            &staff(),
            now,
        )
        .expect("penalization applies");

    let untouched = service
        .sweep_expired(now + chrono::Duration::days(1))
        .expect("early sweep succeeds");
    assert!(untouched.is_empty());
    let still_penalized = repository
        .fetch(&record.employee.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(still_penalized.employee.status().label(), "penalizado");

    let reactivated = service
        .sweep_expired(now + chrono::Duration::days(3))
        .expect("late sweep succeeds");
    assert_eq!(reactivated.len(), 1);
    let restored = repository
        .fetch(&record.employee.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(restored.employee.status().label(), "active");
    assert_eq!(restored.employee.assigned_hours, 35);
}

#[test]
fn placeholder_identity_resolves_once_and_only_once_per_final_id() {
    // Scenario: onboarding without a final ID, then resolving to X123.
    let (service, _, _) = build_service();

    let first = service
        .onboard(intake(None, 20), &admin(), day(2025, 1, 7))
        .expect("placeholder onboarding succeeds");
    assert!(first.employee.id.0.starts_with("tmp-"));
    assert_eq!(first.employee.status().label(), "pendiente_activacion");

    let activated = service
        .resolve_identity(
            &first.employee.id,
            EmployeeId("X123".to_string()),
            &admin(),
            day(2025, 1, 10),
        )
        .expect("identity resolution succeeds");
    assert_eq!(activated.employee.id.0, "X123");
    assert_eq!(activated.employee.status().label(), "active");
    assert!(matches!(
        service.get(&first.employee.id),
        Err(LifecycleError::Repository(RepositoryError::NotFound))
    ));

    let second = service
        .onboard(intake(None, 10), &admin(), day(2025, 1, 8))
        .expect("second placeholder onboarding succeeds");
    let result = service.resolve_identity(
        &second.employee.id,
        EmployeeId("X123".to_string()),
        &admin(),
        day(2025, 1, 11),
    );
    assert!(matches!(
        result,
        Err(LifecycleError::Repository(RepositoryError::Conflict))
    ));
}

#[test]
fn standard_actors_cannot_onboard_without_a_final_id() {
    // Scenario: creating an employee with no final ID as a standard actor.
    let (service, _, _) = build_service();

    let result = service.onboard(intake(None, 20), &staff(), day(2025, 1, 7));

    assert!(matches!(result, Err(LifecycleError::Forbidden { .. })));
}

#[test]
fn concurrent_proposals_produce_exactly_one_pending_request() {
    let (service, _, _) = build_service();
    let record = onboard_active(&service, "E-CONC", 40);
    let id = record.employee.id.clone();
    const WORKERS: usize = 8;

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let service = service.clone();
                let id = id.clone();
                scope.spawn(move || {
                    let actor = staffline::lifecycle::Actor::new(
                        format!("proposer-{worker}"),
                        staffline::lifecycle::ActorRole::Staff,
                    );
                    service.propose_company_leave(
                        &id,
                        CompanyLeaveKind::Voluntaria,
                        day(2025, 6, 30),
                        &actor,
                        day(2025, 6, 1),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker completes"))
            .collect()
    });

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1, "exactly one proposal may win");
    for result in results {
        if let Err(error) = result {
            assert!(
                matches!(
                    error,
                    LifecycleError::Repository(RepositoryError::Conflict)
                ),
                "losers must see a retryable conflict, got {error:?}"
            );
        }
    }
    assert_eq!(
        service.pending_requests().expect("listing succeeds").len(),
        1
    );
}

#[test]
fn approved_leaves_survive_as_denormalized_history() {
    let (service, repository, _) = build_service();
    let record = onboard_active(&service, "E-HIST", 32);
    let request = service
        .propose_company_leave(
            &record.employee.id,
            CompanyLeaveKind::Despido,
            day(2025, 7, 15),
            &staff(),
            day(2025, 7, 1),
        )
        .expect("proposal succeeds");

    service
        .resolve_company_leave(&request.id, LeaveDecision::Approve, &admin(), day(2025, 7, 2))
        .expect("approval succeeds");

    // The live record is gone but the snapshot keeps the employee's fields.
    assert!(service.get(&record.employee.id).is_err());
    let snapshots = repository.company_leaves();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].full_name, "Carmen Vidal");
    assert_eq!(snapshots[0].preserved_hours, 32);
    let history = service
        .leave_history(&record.employee.id)
        .expect("history listing succeeds");
    assert_eq!(history.company.len(), 1);
}
