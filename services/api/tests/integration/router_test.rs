use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use uuid::Uuid;

use crm_api::router::build_router;
use crm_api::state::{AppState, RateLimits};
use crm_auth_types::identity::JwtSecret;
use crm_testing::auth::{MockAuth, TEST_JWT_SECRET};

/// A server whose database is disconnected and whose Redis is unreachable,
/// enough to exercise every check that runs before storage is touched.
fn offline_server() -> TestServer {
    let redis = deadpool_redis::Config::from_url("redis://127.0.0.1:1")
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .unwrap();
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        redis,
        jwt_secret: JwtSecret::new(TEST_JWT_SECRET),
        jwt_ttl_secs: 3600,
        rate_limits: RateLimits {
            default_per_minute: 100,
            sensitive_per_minute: 20,
            trust_forwarded_for: false,
        },
    };
    TestServer::new(build_router(state, "*")).unwrap()
}

fn header(name: &'static str, value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_str(value).unwrap(),
    )
}

#[tokio::test]
async fn should_answer_liveness_probe() {
    let server = offline_server();
    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn should_report_unready_without_database() {
    let server = offline_server();
    let response = server.get("/readyz").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_echo_request_id() {
    let server = offline_server();
    let response = server.get("/healthz").await;
    let id = response.header("x-request-id");
    assert!(id.to_str().unwrap().parse::<Uuid>().is_ok());
}

#[tokio::test]
async fn should_answer_cors_preflight_with_request_id() {
    let server = offline_server();
    let (origin, origin_value) = header("origin", "https://crm.example.com");
    let (method, method_value) = header("access-control-request-method", "POST");
    let response = server
        .method(axum::http::Method::OPTIONS, "/api/auth/login")
        .add_header(origin, origin_value)
        .add_header(method, method_value)
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "*");
    assert!(response.maybe_header("x-request-id").is_some());
}

#[tokio::test]
async fn should_reject_staff_route_without_bearer() {
    let server = offline_server();
    let response = server.get("/api/viewing-records").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn should_forbid_agent_on_admin_routes() {
    let server = offline_server();
    let (name, value) = MockAuth::agent().header();

    for path in ["/api/users", "/api/api-keys"] {
        let response = server
            .get(path)
            .add_header(name.clone(), value.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN, "{path}");
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    let response = server
        .delete(&format!("/api/viewing-records/{}", Uuid::now_v7()))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_reject_public_route_without_credentials() {
    let server = offline_server();
    let response = server
        .post("/api/public/viewing-records")
        .json(&serde_json::json!({ "tenantName": "Li" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "MISSING_API_CREDENTIALS");
}

#[tokio::test]
async fn should_reject_public_route_with_stale_timestamp() {
    let server = offline_server();
    let stale = (Utc::now() - Duration::minutes(10)).timestamp_millis();
    let (k_name, k_value) = header("x-api-key", "ak_whatever");
    let (s_name, s_value) = header("x-api-secret", "secret");
    let (t_name, t_value) = header("x-timestamp", &stale.to_string());
    let (n_name, n_value) = header("x-nonce", "n-1");

    let response = server
        .get("/api/public/viewing-records")
        .add_header(k_name, k_value)
        .add_header(s_name, s_value)
        .add_header(t_name, t_value)
        .add_header(n_name, n_value)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "REQUEST_EXPIRED");
}

#[tokio::test]
async fn should_reject_unknown_filter_value() {
    let server = offline_server();
    let (name, value) = MockAuth::admin().header();
    let response = server
        .get("/api/viewing-records")
        .add_query_param("viewingStatus", "lost")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
