use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_predictive_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use service_advisor::config::AppConfig;
use service_advisor::error::AppError;
use service_advisor::telemetry;
use service_advisor::workflows::maintenance::{JsonFileRepository, PredictiveMaintenanceService};
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

    let repository = Arc::new(JsonFileRepository::new(config.data.dir.clone()));
    let predictive_service = Arc::new(PredictiveMaintenanceService::new(repository));

    let app = with_predictive_routes(predictive_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.data.dir.display(),
        "service advisor ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
