use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryEmployeeRepository, InMemoryNotificationPublisher, StaticTokenResolver,
};
use crate::routes::with_lifecycle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use staffline::config::AppConfig;
use staffline::error::AppError;
use staffline::lifecycle::{EmployeeLifecycleService, LifecycleApi};
use staffline::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryEmployeeRepository::default());
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let lifecycle_service = Arc::new(EmployeeLifecycleService::new(repository, notifications));
    let api = LifecycleApi {
        service: lifecycle_service,
        identity: Arc::new(StaticTokenResolver::default()),
        expiry_warning_days: config.lifecycle.expiry_warning_days,
    };

    let app = with_lifecycle_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "employee lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
