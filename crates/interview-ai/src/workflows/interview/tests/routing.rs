use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::interview::domain::InterviewMode;
use crate::workflows::interview::router::{interview_router, InterviewRegistry};
use crate::workflows::interview::service::FlowSettings;

fn registry() -> Arc<InterviewRegistry<ScriptedGenerator, RecordingStore>> {
    Arc::new(InterviewRegistry::new(
        Arc::new(ScriptedGenerator::default()),
        Arc::new(RecordingStore::default()),
        FlowSettings::default(),
    ))
}

fn post_json(uri: &str, payload: &Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(payload).expect("serialize payload"),
        ))
        .expect("build request")
}

#[tokio::test]
async fn create_and_start_returns_the_first_round() {
    let registry = registry();
    let router = interview_router(registry.clone());

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/interviews",
            &json!({ "job_title": "Backend Engineer" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let session_id = payload
        .get("session_id")
        .and_then(Value::as_str)
        .expect("session id returned")
        .to_string();

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/interviews/{session_id}/start"),
            &json!({ "permission": "granted" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = read_json_body(response).await;
    assert_eq!(payload.get("round").and_then(Value::as_str), Some("aptitude"));
    let questions = payload
        .get("questions")
        .and_then(Value::as_array)
        .expect("questions present");
    assert_eq!(questions.len(), 2);
    assert!(
        questions[0].get("correct_answer").is_none(),
        "canonical answers never cross the wire"
    );
}

#[tokio::test]
async fn permission_denial_is_forbidden_and_recoverable() {
    let registry = registry();
    let router = interview_router(registry.clone());
    let session_id = registry.create("Software Engineer", "Candidate", InterviewMode::Full);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/interviews/{session_id}/start"),
            &json!({ "permission": "denied" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The session stayed in welcome; granting permission still works.
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/interviews/{session_id}/start"),
            &json!({ "permission": "granted" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_sessions_return_not_found() {
    let router = interview_router(registry());

    let response = router
        .oneshot(post_json(
            "/api/v1/interviews/missing/start",
            &json!({ "permission": "granted" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_order_submission_conflicts() {
    let registry = registry();
    let router = interview_router(registry.clone());
    let session_id = registry.create("Software Engineer", "Candidate", InterviewMode::Full);

    // Submitting aptitude answers before start() is a state conflict.
    let response = router
        .oneshot(post_json(
            &format!("/api/v1/interviews/{session_id}/aptitude"),
            &json!({ "answers": [null, null] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn abandoned_sessions_are_discarded() {
    let registry = registry();
    let router = interview_router(registry.clone());
    let session_id = registry.create("Software Engineer", "Candidate", InterviewMode::Full);

    let response = router
        .clone()
        .oneshot(
            axum::http::Request::delete(format!("/api/v1/interviews/{session_id}"))
                .body(axum::body::Body::empty())
                .expect("build request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(
            axum::http::Request::get(format!("/api/v1/interviews/{session_id}"))
                .body(axum::body::Body::empty())
                .expect("build request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
