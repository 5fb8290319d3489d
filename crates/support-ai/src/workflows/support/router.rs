use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::ApplicationId;
use super::orchestrator::PipelineError;
use super::repository::{RepositoryError, StateRepository};
use super::service::{ApplicationSubmission, ServiceError, SupportPipelineService};

/// Router builder exposing HTTP endpoints for intake and status lookup.
pub fn application_router<R>(service: Arc<SupportPipelineService<R>>) -> Router
where
    R: StateRepository + 'static,
{
    Router::new()
        .route("/api/v1/support/applications", post(submit_handler::<R>))
        .route(
            "/api/v1/support/applications/:application_id",
            get(status_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<SupportPipelineService<R>>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: StateRepository + 'static,
{
    match service.submit(submission) {
        Ok(state) => (StatusCode::ACCEPTED, axum::Json(state.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<SupportPipelineService<R>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: StateRepository + 'static,
{
    let id = ApplicationId(application_id);
    match service.status(&id) {
        Ok(state) => (StatusCode::OK, axum::Json(state.status_view())).into_response(),
        Err(ServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "application_id": id.0,
                "error": "application not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::Repository(RepositoryError::Unavailable(_))
        | ServiceError::Pipeline(PipelineError::Persistence(RepositoryError::Unavailable(_))) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
