//! Integration tests for the authenticated HTTP wrapper.
//!
//! Verifies that the bearer token is attached when present, omitted when
//! absent, and wiped centrally on the first 401.

use std::sync::Arc;

use docwatch_client::ApiClient;
use docwatch_core::{Error, SessionStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Arc<SessionStore> {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::open(dir.path().join("session.json")).unwrap();
    Arc::new(store)
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/document-monitor/clients"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"plugins": []})))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    session.set_credentials("tok-123", None).unwrap();
    let api = ApiClient::new(server.uri(), session).unwrap();

    let resp: serde_json::Value = api
        .get_json(&api.central_url("/api/document-monitor/clients"))
        .await
        .unwrap();
    assert_eq!(resp["plugins"], serde_json::json!([]));
}

#[tokio::test]
async fn test_requests_without_token_have_no_auth_header() {
    let server = MockServer::start().await;

    // Any request carrying an Authorization header trips the 500 mock.
    Mock::given(method("GET"))
        .and(path("/api/document-monitor/clients"))
        .and(wiremock::matchers::header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/document-monitor/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"plugins": []})))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri(), session()).unwrap();
    let resp: serde_json::Value = api
        .get_json(&api.central_url("/api/document-monitor/clients"))
        .await
        .unwrap();
    assert_eq!(resp["plugins"], serde_json::json!([]));
}

#[tokio::test]
async fn test_401_wipes_credentials_and_surfaces_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/document-monitor/clients"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let session = session();
    session
        .set_credentials("tok-expired", Some("admin".to_string()))
        .unwrap();
    let api = ApiClient::new(server.uri(), session.clone()).unwrap();

    let result: docwatch_core::Result<serde_json::Value> = api
        .get_json(&api.central_url("/api/document-monitor/clients"))
        .await;

    match result {
        Err(Error::Unauthorized(_)) => {}
        other => panic!("Expected Unauthorized, got {:?}", other.map(|_| ())),
    }
    assert_eq!(session.token(), None);
    assert_eq!(session.user_role(), None);
}

#[tokio::test]
async fn test_404_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri(), session()).unwrap();
    let result: docwatch_core::Result<serde_json::Value> =
        api.get_json(&api.central_url("/api/missing")).await;

    match result {
        Err(Error::NotFound(url)) => assert!(url.contains("/api/missing")),
        other => panic!("Expected NotFound, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_server_error_body_is_preserved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri(), session()).unwrap();
    let result: docwatch_core::Result<serde_json::Value> =
        api.get_json(&api.central_url("/api/broken")).await;

    match result {
        Err(Error::Request(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("database unavailable"));
        }
        other => panic!("Expected Request error, got {:?}", other.map(|_| ())),
    }
}
