use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::approval::LeaveDecision;
use super::domain::{Actor, ActorRole, EmployeeId, IdentityResolver, LeaveRequestId, NewEmployee};
use super::events::NotificationPublisher;
use super::repository::{EmployeeRepository, RepositoryError};
use super::service::{
    EmployeeLifecycleService, LifecycleError, TransitionOutcome, TransitionRequest,
};

/// State shared by the lifecycle endpoints: the executor, the identity
/// boundary that turns bearer tokens into actors, and the default window for
/// the expiring-penalizations report.
pub struct LifecycleApi<R, P> {
    pub service: Arc<EmployeeLifecycleService<R, P>>,
    pub identity: Arc<dyn IdentityResolver>,
    pub expiry_warning_days: i64,
}

impl<R, P> Clone for LifecycleApi<R, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
            expiry_warning_days: self.expiry_warning_days,
        }
    }
}

/// Router builder exposing HTTP endpoints for the employee lifecycle.
pub fn lifecycle_router<R, P>(api: LifecycleApi<R, P>) -> Router
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/employees", post(onboard_handler::<R, P>))
        .route("/api/v1/employees/:employee_id", get(employee_handler::<R, P>))
        .route(
            "/api/v1/employees/:employee_id/transition",
            post(transition_handler::<R, P>),
        )
        .route(
            "/api/v1/employees/:employee_id/activate",
            post(activate_handler::<R, P>),
        )
        .route(
            "/api/v1/employees/:employee_id/leaves",
            get(leave_history_handler::<R, P>),
        )
        .route(
            "/api/v1/leave-requests",
            get(pending_requests_handler::<R, P>),
        )
        .route(
            "/api/v1/leave-requests/:request_id/resolve",
            post(resolve_handler::<R, P>),
        )
        .route(
            "/api/v1/penalizations/expiring",
            get(expiring_handler::<R, P>),
        )
        .route("/api/v1/penalizations/sweep", post(sweep_handler::<R, P>))
        .with_state(api)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OnboardBody {
    #[serde(flatten)]
    pub(crate) intake: NewEmployee,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionBody {
    #[serde(flatten)]
    pub(crate) transition: TransitionRequest,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivateBody {
    pub(crate) final_id: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveBody {
    pub(crate) decision: LeaveDecision,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpiringQuery {
    #[serde(default)]
    pub(crate) days: Option<i64>,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SweepBody {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

fn actor_from<R, P>(api: &LifecycleApi<R, P>, headers: &HeaderMap) -> Actor {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| api.identity.resolve(token))
        .unwrap_or_else(|| Actor::new("anonymous", ActorRole::Guest))
}

fn effective_date(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| Local::now().date_naive())
}

fn error_response(error: LifecycleError) -> Response {
    let status = match &error {
        LifecycleError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::Forbidden { .. } => StatusCode::FORBIDDEN,
        LifecycleError::AlreadyResolved => StatusCode::CONFLICT,
        LifecycleError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LifecycleError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LifecycleError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn onboard_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<OnboardBody>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let actor = actor_from(&api, &headers);
    let today = effective_date(body.today);
    match api.service.onboard(body.intake, &actor, today) {
        Ok(record) => (
            StatusCode::CREATED,
            axum::Json(record.employee.status_view()),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn employee_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Path(employee_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let id = EmployeeId(employee_id);
    match api.service.get(&id) {
        Ok(record) => {
            (StatusCode::OK, axum::Json(record.employee.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Path(employee_id): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<TransitionBody>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let actor = actor_from(&api, &headers);
    let id = EmployeeId(employee_id);
    let today = effective_date(body.today);
    match api
        .service
        .apply_transition(&id, body.transition, &actor, today)
    {
        Ok(outcome @ TransitionOutcome::AwaitingApproval { .. }) => {
            (StatusCode::ACCEPTED, axum::Json(outcome)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activate_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Path(employee_id): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<ActivateBody>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let actor = actor_from(&api, &headers);
    let placeholder = EmployeeId(employee_id);
    let today = effective_date(body.today);
    match api
        .service
        .resolve_identity(&placeholder, EmployeeId(body.final_id), &actor, today)
    {
        Ok(record) => {
            (StatusCode::OK, axum::Json(record.employee.status_view())).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn leave_history_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Path(employee_id): Path<String>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let id = EmployeeId(employee_id);
    match api.service.leave_history(&id) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn pending_requests_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    match api.service.pending_requests() {
        Ok(requests) => (StatusCode::OK, axum::Json(requests)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn resolve_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<ResolveBody>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let actor = actor_from(&api, &headers);
    let id = LeaveRequestId(request_id);
    let today = effective_date(body.today);
    match api
        .service
        .resolve_company_leave(&id, body.decision, &actor, today)
    {
        Ok(request) => (StatusCode::OK, axum::Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn expiring_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    Query(query): Query<ExpiringQuery>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let days = query.days.unwrap_or(api.expiry_warning_days).max(0);
    let today = effective_date(query.today);
    match api.service.expiring_within(days, today) {
        Ok(expiring) => (StatusCode::OK, axum::Json(expiring)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sweep_handler<R, P>(
    State(api): State<LifecycleApi<R, P>>,
    body: Option<axum::Json<SweepBody>>,
) -> Response
where
    R: EmployeeRepository + 'static,
    P: NotificationPublisher + 'static,
{
    let today = effective_date(body.and_then(|axum::Json(body)| body.today));
    match api.service.sweep_expired(today) {
        Ok(reactivated) => (
            StatusCode::OK,
            axum::Json(json!({ "reactivated": reactivated })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
