use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionStore};
use crate::routes::with_interview_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use interview_ai::config::AppConfig;
use interview_ai::error::AppError;
use interview_ai::telemetry;
use interview_ai::workflows::interview::{
    FlowSettings, GeneratorError, HttpGenerator, InterviewRegistry,
};
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

    let generator = Arc::new(HttpGenerator::new(&config.generator).map_err(client_error)?);
    let store = Arc::new(InMemorySessionStore::default());
    let settings = FlowSettings::from_generator_config(&config.generator);
    let registry = Arc::new(InterviewRegistry::new(generator, store, settings));

    let app = with_interview_routes(registry)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "interview orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn client_error(err: GeneratorError) -> AppError {
    AppError::Io(std::io::Error::other(err.to_string()))
}
