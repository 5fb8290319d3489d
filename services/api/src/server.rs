use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{load_classifier, AppState, InMemoryStateRepository, JsonFieldExtractor, TemplateAdvisor};
use crate::routes::with_application_routes;
use support_ai::config::AppConfig;
use support_ai::error::AppError;
use support_ai::telemetry;
use support_ai::workflows::support::eligibility::EligibilityScorer;
use support_ai::workflows::support::{PipelineConfig, SupportPipelineService};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(model) = args.model.take() {
        config.model_path = Some(model);
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let classifier = load_classifier(&config)?;
    let pipeline_config = PipelineConfig::default();
    let scorer = EligibilityScorer::new(classifier, pipeline_config.scoring.clone())
        .with_advisor(Arc::new(TemplateAdvisor));

    let repository = Arc::new(InMemoryStateRepository::default());
    let service = Arc::new(SupportPipelineService::from_parts(
        scorer,
        Arc::new(JsonFieldExtractor),
        repository,
        pipeline_config,
    ));

    let app = with_application_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "social support pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}
