//! Integration tests for the gateway HTTP API.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use http::Method;
use jobmatch_common::ServiceKind;
use jobmatch_gateway::test_util::{descriptor, external_body, test_settings};
use jobmatch_gateway::{app, AppState, ConfigSnapshot, ConfigStore, HttpTransport};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_state(store: ConfigStore) -> Arc<AppState> {
    let settings = test_settings(store.source());
    Arc::new(AppState::new(
        settings,
        Arc::new(store),
        Arc::new(HttpTransport::new()),
    ))
}

fn state_with(snapshot: ConfigSnapshot) -> Arc<AppState> {
    http_state(ConfigStore::new("unused-services.yaml", snapshot))
}

fn write_services(path: &Path, contents: &str) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.sync_all().unwrap();
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn salary_body() -> Value {
    json!({ "job_title": "Senior Data Scientist", "location": "Berlin" })
}

#[tokio::test]
async fn test_external_success_passes_payload_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(external_body(ServiceKind::SalaryPredictor)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/predict", server.uri());
    let app = app(state_with(ConfigSnapshot::new(
        1,
        [descriptor(ServiceKind::SalaryPredictor, &endpoint, 2_000)],
    )));

    let (status, json) = send(&app, Method::POST, "/api/predict-salary", Some(salary_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["baseline"], false);
    assert_eq!(json["predicted_salary"], 151000);
    assert_eq!(json["method"], "gradient_boosting");
    assert_eq!(json["_meta"]["source"], "external");
    assert_eq!(json["_meta"]["endpoint"], endpoint.as_str());
}

#[tokio::test]
async fn test_slow_service_times_out_to_baseline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(external_body(ServiceKind::SalaryPredictor))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let app = app(state_with(ConfigSnapshot::new(
        1,
        [descriptor(ServiceKind::SalaryPredictor, &server.uri(), 100)],
    )));

    let started = Instant::now();
    let (status, json) = send(&app, Method::POST, "/api/predict-salary", Some(salary_body())).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["baseline"], true);
    assert_eq!(json["predicted_salary"], 170000);
    assert_eq!(json["method"], "industry_average");
    assert_eq!(json["_meta"]["fallback_reason"], "timeout");
}

#[tokio::test]
async fn test_error_status_and_bad_schema_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rank"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/parse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "skills": "rust" })))
        .mount(&server)
        .await;

    let app = app(state_with(ConfigSnapshot::new(
        1,
        [
            descriptor(ServiceKind::CandidateRanker, &format!("{}/rank", server.uri()), 2_000),
            descriptor(ServiceKind::ResumeParser, &format!("{}/parse", server.uri()), 2_000),
        ],
    )));

    let (_, json) = send(
        &app,
        Method::POST,
        "/api/rank-candidates",
        Some(json!({
            "job_id": 1,
            "candidate_profiles": [
                {"id": 30, "applied_at": "2024-01-03T00:00:00Z"},
                {"id": 10, "applied_at": "2024-01-01T00:00:00Z"},
                {"id": 20, "applied_at": "2024-01-02T00:00:00Z"}
            ]
        })),
    )
    .await;
    assert_eq!(json["baseline"], true);
    assert_eq!(json["ranked_candidate_ids"], json!([10, 20, 30]));
    assert_eq!(json["_meta"]["fallback_reason"], "non_success_status");

    let (_, json) = send(
        &app,
        Method::POST,
        "/api/parse-resume",
        Some(json!({ "resume_text": "Rust and Docker, 5 years" })),
    )
    .await;
    assert_eq!(json["baseline"], true);
    assert_eq!(json["skills"], json!(["rust", "docker"]));
    assert_eq!(json["experience_years"], 5);
    assert_eq!(json["_meta"]["fallback_reason"], "invalid_response_schema");
}

#[tokio::test]
async fn test_disabled_service_answers_without_calling_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("services.yaml");
    write_services(
        &file,
        &format!(
            "services:\n  demand_forecaster:\n    endpoint: {}/forecast\n    enabled: false\n",
            server.uri()
        ),
    );
    let app = app(http_state(ConfigStore::open(&file)));

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/forecast-demand",
        Some(json!({ "skill_category": "Rust", "current_open_postings": 10, "forecast_horizon": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["baseline"], true);
    assert_eq!(json["predicted_demand"], json!([10, 10]));
    assert_eq!(json["_meta"]["fallback_reason"], "service_disabled");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = app(state_with(ConfigSnapshot::new(1, [])));
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/recommend",
        Some(json!({ "candidate_id": "not a number" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "invalid_request");
}

#[tokio::test]
async fn test_admin_reload_redirects_next_dispatch() {
    let old = MockServer::start().await;
    let new = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(external_body(ServiceKind::JobRecommender)),
        )
        .expect(1)
        .mount(&old)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(external_body(ServiceKind::JobRecommender)),
        )
        .expect(1)
        .mount(&new)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("services.yaml");
    write_services(&file, &format!("services:\n  job_recommender: {}\n", old.uri()));
    let app = app(http_state(ConfigStore::open(&file)));

    let request = json!({ "candidate_id": 1 });
    let (_, json) = send(&app, Method::POST, "/api/recommend", Some(request.clone())).await;
    assert_eq!(json["_meta"]["config_sequence"], 1);

    write_services(&file, &format!("services:\n  job_recommender: {}\n", new.uri()));
    let (status, json) = send(&app, Method::POST, "/admin/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["sequence"], 2);

    let (_, json) = send(&app, Method::POST, "/api/recommend", Some(request)).await;
    assert_eq!(json["baseline"], false);
    assert_eq!(json["_meta"]["config_sequence"], 2);
    assert_eq!(json["_meta"]["endpoint"], new.uri().as_str());
}

#[tokio::test]
async fn test_invalid_reload_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("services.yaml");
    write_services(&file, "services:\n  salary_predictor: http://localhost:5002/predict\n");
    let app = app(http_state(ConfigStore::open(&file)));

    write_services(&file, "services:\n  salary_predictor:\n    timeout_ms: 0\n");
    let (status, json) = send(&app, Method::POST, "/admin/reload-config", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["type"], "reload_rejected");

    let (status, json) = send(&app, Method::GET, "/admin/config", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["sequence"], 1);
    assert!(json["last_reload_error"]["message"]
        .as_str()
        .unwrap()
        .contains("timeout_ms"));

    let (_, json) = send(&app, Method::GET, "/config", None).await;
    assert_eq!(json["snapshot"]["sequence"], 1);
}

#[tokio::test]
async fn test_health_and_metrics_reports() {
    let app = app(state_with(ConfigSnapshot::new(
        1,
        [descriptor(ServiceKind::CandidateSegmenter, "http://127.0.0.1:9/segment", 500)],
    )));

    let (_, json) = send(&app, Method::GET, "/admin/health/segment-candidates", None).await;
    assert_eq!(json["status"], "unknown");
    assert_eq!(json["enabled"], true);

    let body = json!({ "candidate_profiles": [{"id": 1, "category": "eng"}] });
    for _ in 0..3 {
        let (_, json) = send(&app, Method::POST, "/api/segment-candidates", Some(body.clone())).await;
        assert_eq!(json["baseline"], true);
        assert_eq!(json["_meta"]["fallback_reason"], "connection_refused");
    }

    let (_, json) = send(&app, Method::GET, "/admin/health/candidate_segmenter", None).await;
    assert_eq!(json["status"], "down");
    assert_eq!(json["window_failures"], 3);

    let (status, json) = send(&app, Method::GET, "/admin/metrics/segment-candidates", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_requests"], 3);
    assert_eq!(json["failure_count"], 3);
    assert_eq!(json["failures_by_kind"]["connection_refused"], 3);
    assert_eq!(json["last_error"]["kind"], "connection_refused");

    let (_, json) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["services"]["candidate_segmenter"], "down");
    assert_eq!(json["services"]["job_recommender"], "unknown");

    let (_, json) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(json["services"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_unknown_service_is_not_found() {
    let app = app(state_with(ConfigSnapshot::defaults()));
    let (status, json) = send(&app, Method::GET, "/admin/metrics/fortune-teller", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["type"], "unknown_service");
}

#[tokio::test]
async fn test_index_lists_prediction_routes() {
    let app = app(state_with(ConfigSnapshot::defaults()));
    let (status, json) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["routes"]["salary_predictor"], "/api/predict-salary");
    assert_eq!(json["routes"].as_object().unwrap().len(), 6);
}
