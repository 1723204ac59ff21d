//! Mock API tests for the HTTP transport and backend.
//!
//! These tests use wiremock to simulate the admin API and exercise the full
//! session: login, token attachment, refresh and termination.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::{Value, json};
use tokengate_core::error::TransportError;
use tokengate_core::memory::MemoryCredentialStore;
use tokengate_core::traits::CredentialStore;
use tokengate_core::{
    AccessToken, ApiRequest, ApiUrl, AuthError, AuthSession, ClientConfig, CredentialPair,
    Credentials, Error, RefreshToken,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create an API URL from a mock server.
fn mock_api_url(server: &MockServer) -> ApiUrl {
    ApiUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

struct Harness {
    session: AuthSession,
    store: Arc<MemoryCredentialStore>,
    routes: Arc<Mutex<Vec<String>>>,
}

fn harness(server: &MockServer, store: MemoryCredentialStore) -> Harness {
    let store = Arc::new(store);
    let routes = Arc::new(Mutex::new(Vec::new()));
    let recorded = routes.clone();
    let session = tokengate_http::connect(
        ClientConfig::new(mock_api_url(server)),
        store.clone(),
        Arc::new(move |route: &str| recorded.lock().unwrap().push(route.to_string())),
    )
    .unwrap();

    Harness {
        session,
        store,
        routes,
    }
}

fn signed_in() -> MemoryCredentialStore {
    MemoryCredentialStore::with_credentials(CredentialPair::new(
        AccessToken::new("A1"),
        RefreshToken::new("R1"),
    ))
}

fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({
        "statusCode": 401,
        "error": "Unauthorized",
        "message": "jwt expired"
    }))
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "admin@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": "u-1",
                "fullname": "Store Admin",
                "email": "admin@example.com",
                "role": "admin",
                "storeId": "s-9"
            },
            "accessToken": "A1",
            "refreshToken": "R1"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, MemoryCredentialStore::new());
    let user = h
        .session
        .login(&Credentials::new("admin@example.com", "secret123"))
        .await
        .unwrap();

    assert_eq!(user.id, "u-1");
    assert_eq!(user.display_name(), "Store Admin");
    assert_eq!(user.extra["storeId"], "s-9");
    assert!(h.session.is_authenticated());
    let pair = h.store.credentials().unwrap();
    assert_eq!(pair.access_token().as_str(), "A1");
    assert_eq!(pair.refresh_token().as_str(), "R1");
}

#[tokio::test]
async fn test_login_with_username() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "secret123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "u-1", "username": "admin", "role": "admin"},
            "accessToken": "A1",
            "refreshToken": "R1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, MemoryCredentialStore::new());
    let user = h
        .session
        .login(&Credentials::new("admin", "secret123"))
        .await
        .unwrap();

    assert_eq!(user.username.as_deref(), Some("admin"));
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "Invalid username or password"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, MemoryCredentialStore::new());
    let err = h
        .session
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.as_auth(), Some(&AuthError::InvalidCredentials));
    assert!(!h.session.is_authenticated());
}

// ============================================================================
// Request Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_request_carries_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let body: Value = h.session.get("/orders").await.unwrap();

    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_replayed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refreshToken": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let body: Value = h.session.get("/orders").await.unwrap();

    assert_eq!(body["total"], 2);
    let pair = h.store.credentials().unwrap();
    assert_eq!(pair.access_token().as_str(), "A2");
    assert_eq!(pair.refresh_token().as_str(), "R1");
}

#[tokio::test]
async fn test_refresh_call_carries_no_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "A2", "refreshToken": "R2"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    h.session.refresh().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));

    let pair = h.store.credentials().unwrap();
    assert_eq!(pair.access_token().as_str(), "A2");
    assert_eq!(pair.refresh_token().as_str(), "R2");
}

#[tokio::test]
async fn test_concurrent_expiries_share_one_refresh() {
    let server = MockServer::start().await;

    for resource in ["/api/orders", "/api/products", "/api/promotions"] {
        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("authorization", "Bearer A1"))
            .respond_with(unauthorized())
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "A2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let results = join_all(
        ["/orders", "/products", "/promotions"]
            .into_iter()
            .map(|p| h.session.send(ApiRequest::get(p))),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap().status, 200);
    }
    assert_eq!(h.session.coordinator().refresh_calls(), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_rejection_after_refresh_is_a_double_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(unauthorized())
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let err = h
        .session
        .send(ApiRequest::get("/orders"))
        .await
        .unwrap_err();

    assert_eq!(err.as_auth(), Some(&AuthError::DoubleFailure));
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn test_refresh_failure_terminates_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "Refresh token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let err = h
        .session
        .send(ApiRequest::get("/orders"))
        .await
        .unwrap_err();

    assert_eq!(
        err.as_auth(),
        Some(&AuthError::RefreshFailed {
            reason: "Refresh token expired".into()
        })
    );
    assert!(h.store.credentials().is_none());
    assert_eq!(*h.routes.lock().unwrap(), vec!["/sign-in".to_string()]);
}

#[tokio::test]
async fn test_failed_remote_logout_still_clears_locally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    h.session.logout().await;

    assert!(!h.session.is_authenticated());
    assert_eq!(h.routes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_status_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": 400,
            "error": "Bad Request",
            "message": ["name should not be empty"]
        })))
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let err = h
        .session
        .post::<_, Value>("/products", &json!({"name": ""}))
        .await
        .unwrap_err();

    match err {
        Error::Protocol(e) => {
            assert_eq!(e.status, 400);
            assert_eq!(e.message.as_deref(), Some("name should not be empty"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.session.coordinator().refresh_calls(), 0);
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .and(wiremock::matchers::query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, signed_in());
    let response = h
        .session
        .send(ApiRequest::get("/orders").query("status", "pending"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    // Nothing listens on the discard port.
    let config = ClientConfig::new(ApiUrl::new("http://127.0.0.1:9").unwrap());
    let session = tokengate_http::connect(
        config,
        Arc::new(signed_in()),
        Arc::new(|_: &str| {}),
    )
    .unwrap();

    let err = session
        .send(ApiRequest::get("/orders"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Connection { .. } | TransportError::Timeout { .. })
    ));
    assert_eq!(session.coordinator().refresh_calls(), 0);
}

#[tokio::test]
async fn test_slow_server_reports_request_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"orders": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig {
        request_timeout: Duration::from_millis(150),
        ..ClientConfig::new(mock_api_url(&server))
    };
    let session = tokengate_http::connect(
        config,
        Arc::new(signed_in()),
        Arc::new(|_: &str| {}),
    )
    .unwrap();

    let err = session
        .send(ApiRequest::get("/orders"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Timeout { duration_ms: 150 })
    ));
}
