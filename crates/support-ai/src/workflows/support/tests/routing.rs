use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::workflows::support::domain::{ApplicationId, DocumentKind};
use crate::workflows::support::extraction::DocumentUpload;
use crate::workflows::support::orchestrator::PipelineConfig;
use crate::workflows::support::repository::StateRepository;
use crate::workflows::support::router::application_router;
use crate::workflows::support::service::{ApplicationSubmission, SupportPipelineService};

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}

fn hardship_uploads() -> Vec<DocumentUpload> {
    vec![
        upload(
            DocumentKind::ApplicationForm,
            "form.pdf",
            json!({
                "applicant_name": "Ahmed Al Mansoori",
                "address": "Villa 12, Al Nahyan, Abu Dhabi",
                "monthly_income": 3000.0,
                "family_size": 6.0,
                "employment_status": "unemployed",
            }),
        ),
        upload(
            DocumentKind::BankStatement,
            "statement.pdf",
            json!({
                "account_holder_name": "Ahmed Al Mansoori",
                "credit_transactions": [2950.0, 3050.0, 3000.0],
            }),
        ),
        upload(
            DocumentKind::EmiratesId,
            "id.jpg",
            json!({
                "name": "Ahmed Al Mansoori",
                "address": "Villa 12, Al Nahyan, Abu Dhabi",
            }),
        ),
        upload(
            DocumentKind::Resume,
            "resume.docx",
            json!({ "name": "Ahmed Al Mansoori" }),
        ),
        upload(
            DocumentKind::AssetsLiabilities,
            "assets.xlsx",
            json!({ "total_assets": 5000.0, "total_liabilities": 20000.0 }),
        ),
        upload(
            DocumentKind::CreditReport,
            "credit.pdf",
            json!({ "outstanding_debt": 9000.0 }),
        ),
    ]
}

fn submission(id: &str, documents: Vec<DocumentUpload>) -> ApplicationSubmission {
    ApplicationSubmission {
        application_id: ApplicationId(id.to_string()),
        documents,
    }
}

fn post_request(payload: &ApplicationSubmission) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/api/v1/support/applications")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("serialize submission"),
        ))
        .expect("request")
}

#[tokio::test]
async fn submit_route_runs_the_pipeline_to_completion() {
    let (service, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(post_request(&submission("app-77", hardship_uploads())))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["application_id"], "app-77");
    assert_eq!(payload["stage"], "completed");
    assert_eq!(payload["decision"], "conditional_approve");
    assert_eq!(payload["support_amount"], 4380);
    assert_eq!(payload["transitions"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn status_route_returns_the_persisted_snapshot() {
    let (service, _) = build_service();
    let router = application_router(Arc::clone(&service));

    router
        .clone()
        .oneshot(post_request(&submission("app-42", hardship_uploads())))
        .await
        .expect("submit response");

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/support/applications/app-42")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("status response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["application_id"], "app-42");
    assert_eq!(payload["stage"], "completed");
    assert_eq!(payload["tier"], "LOW");
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_applications() {
    let (service, _) = build_service();
    let router = application_router(service);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/support/applications/no-such-app")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("status response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unavailable_store_maps_to_service_unavailable() {
    let service = Arc::new(SupportPipelineService::from_parts(
        scorer(),
        Arc::new(JsonExtractor),
        Arc::new(UnavailableRepository),
        PipelineConfig::default(),
    ));
    let router = application_router(service);

    let response = router
        .oneshot(post_request(&submission("app-1", hardship_uploads())))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn resubmission_with_corrected_income_changes_the_outcome() {
    let (service, repository) = build_service();
    let router = application_router(Arc::clone(&service));

    router
        .clone()
        .oneshot(post_request(&submission("app-9", hardship_uploads())))
        .await
        .expect("first submission");

    let mut corrected = hardship_uploads();
    corrected[0] = upload(
        DocumentKind::ApplicationForm,
        "form.pdf",
        json!({
            "applicant_name": "Ahmed Al Mansoori",
            "address": "Villa 12, Al Nahyan, Abu Dhabi",
            "monthly_income": 60000.0,
            "family_size": 6.0,
            "employment_status": "employed",
        }),
    );
    corrected[1] = upload(
        DocumentKind::BankStatement,
        "statement.pdf",
        json!({
            "account_holder_name": "Ahmed Al Mansoori",
            "credit_transactions": [60000.0, 60000.0],
        }),
    );

    let response = router
        .oneshot(post_request(&submission("app-9", corrected)))
        .await
        .expect("second submission");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["decision"], "decline");

    let stored = repository
        .load(&ApplicationId("app-9".to_string()))
        .expect("load")
        .expect("state");
    assert_eq!(
        stored
            .recommendation
            .map(|decision| decision.outcome.label()),
        Some("decline")
    );
}

#[tokio::test]
async fn unreadable_documents_are_skipped_not_fatal() {
    let (service, _) = build_service();
    let router = application_router(service);

    let mut documents = hardship_uploads();
    documents.push(DocumentUpload {
        kind: DocumentKind::CreditReport,
        name: "garbled.bin".to_string(),
        content: "%%not-json%%".to_string(),
    });

    let response = router
        .oneshot(post_request(&submission("app-55", documents)))
        .await
        .expect("router response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["stage"], "completed");
}
