//! Integration tests for the retention cleanup trigger.
//!
//! The call is backend-idempotent: once the bounds hold, a repeat call must
//! report zero further deletions. The mock sequence below reproduces that
//! contract and the test asserts convergence on the second invocation.

use std::sync::Arc;

use docwatch_client::{ApiClient, RetentionClient};
use docwatch_core::SessionStore;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn retention_for(server: &MockServer) -> RetentionClient {
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
    RetentionClient::new(Arc::new(ApiClient::new(server.uri(), session).unwrap()))
}

#[tokio::test]
async fn test_cleanup_sends_bounds_and_parses_counters() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/database-management/pdf-events/cleanup"))
        .and(query_param("max_age_hours", "24"))
        .and(query_param("max_events", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "initial_count": 1200,
            "deleted_by_age": 150,
            "deleted_by_count": 50,
            "final_count": 1000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = retention_for(&server).cleanup_default().await.unwrap();

    assert_eq!(report.initial_count, 1200);
    assert_eq!(report.deleted_by_age, 150);
    assert_eq!(report.deleted_by_count, 50);
    assert_eq!(report.final_count, 1000);
    assert!(!report.is_converged());
}

#[tokio::test]
async fn test_second_cleanup_converges_to_zero_deletions() {
    let server = MockServer::start().await;

    // First call prunes down to the bounds...
    Mock::given(method("POST"))
        .and(path("/api/database-management/pdf-events/cleanup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "initial_count": 1200,
            "deleted_by_age": 150,
            "deleted_by_count": 50,
            "final_count": 1000
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // ...and every subsequent call finds nothing left to delete.
    Mock::given(method("POST"))
        .and(path("/api/database-management/pdf-events/cleanup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "initial_count": 1000,
            "deleted_by_age": 0,
            "deleted_by_count": 0,
            "final_count": 1000
        })))
        .mount(&server)
        .await;

    let retention = retention_for(&server);

    let first = retention.cleanup(24, 1000).await.unwrap();
    assert!(!first.is_converged());

    let second = retention.cleanup(24, 1000).await.unwrap();
    assert!(second.is_converged());
    assert_eq!(second.initial_count, first.final_count);
    assert_eq!(second.final_count, first.final_count);
}
