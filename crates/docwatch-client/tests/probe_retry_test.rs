//! Integration tests for monitor client discovery and liveness probing.
//!
//! Covers the single bounded retry: a probe that fails once but answers on
//! the retry yields a live client, while a probe that fails twice yields an
//! offline record with cleared folders.

use std::sync::Arc;

use docwatch_client::{ApiClient, MonitorRegistry};
use docwatch_core::{MonitorStatus, SessionStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry_for(server: &MockServer) -> MonitorRegistry {
    let dir = tempfile::tempdir().unwrap();
    let session = Arc::new(SessionStore::open(dir.path().join("session.json")).unwrap());
    MonitorRegistry::new(Arc::new(ApiClient::new(server.uri(), session).unwrap()))
}

#[tokio::test]
async fn test_probe_derives_online_client_with_action_flags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_running": true,
            "monitoring_folders": ["/a"],
            "autostart_folders": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let client = registry.probe_client("c1", "ingest", &server.uri()).await;

    assert_eq!(client.status, MonitorStatus::Online);
    assert_eq!(client.folders, vec!["/a".to_string()]);
    assert!(!client.can_start());
    assert!(client.can_pause());
    assert!(client.can_stop());
}

#[tokio::test]
async fn test_probe_derives_paused_when_not_running() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_running": false,
            "monitoring_folders": ["/a", "/b"],
            "autostart_folders": ["/a"]
        })))
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let client = registry.probe_client("c1", "ingest", &server.uri()).await;

    assert_eq!(client.status, MonitorStatus::Paused);
    assert_eq!(client.folders.len(), 2);
    assert_eq!(client.autostart_folders, vec!["/a".to_string()]);
    assert!(client.can_start());
    assert!(!client.can_pause());
}

#[tokio::test]
async fn test_probe_recovers_on_the_single_retry() {
    let server = MockServer::start().await;

    // First attempt fails; the mounted-first mock answers exactly once.
    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_running": true,
            "monitoring_folders": ["/a"],
            "autostart_folders": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let client = registry.probe_client("c1", "ingest", &server.uri()).await;

    assert_eq!(client.status, MonitorStatus::Online);
    assert_eq!(client.folders, vec!["/a".to_string()]);
}

#[tokio::test]
async fn test_probe_failing_twice_is_offline_with_cleared_folders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let client = registry.probe_client("c1", "ingest", &server.uri()).await;

    assert_eq!(client.status, MonitorStatus::Offline);
    assert!(client.folders.is_empty());
    assert!(client.autostart_folders.is_empty());
    assert!(client.can_start());
    assert!(!client.can_pause());
    assert!(!client.can_stop());
}

#[tokio::test]
async fn test_discovery_probes_every_registered_plugin() {
    let central = MockServer::start().await;
    let plugin = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/document-monitor/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "plugins": [
                {"id": "c1", "name": "ingest", "endpoint": plugin.uri()},
                {"id": "c2", "name": "ghost", "endpoint": "http://127.0.0.1:1"}
            ]
        })))
        .mount(&central)
        .await;
    Mock::given(method("GET"))
        .and(path("/monitor/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_running": true,
            "monitoring_folders": [],
            "autostart_folders": []
        })))
        .mount(&plugin)
        .await;

    let registry = registry_for(&central);
    let clients = registry.discover().await.unwrap();

    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].id, "c1");
    assert_eq!(clients[0].status, MonitorStatus::Online);
    // The unreachable plugin degrades to offline instead of failing discovery.
    assert_eq!(clients[1].status, MonitorStatus::Offline);
}

#[tokio::test]
async fn test_start_sends_current_folder_list() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/monitor/start"))
        .and(wiremock::matchers::body_json(serde_json::json!({
            "folder_paths": ["/a", "/b"]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let mut client = docwatch_core::MonitorClient::offline("c1", "ingest", server.uri());
    client.folders = vec!["/a".to_string(), "/b".to_string()];

    registry.start(&client).await.unwrap();
}

#[tokio::test]
async fn test_pause_is_an_alias_for_stop() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/monitor/stop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registry = registry_for(&server);
    let mut client = docwatch_core::MonitorClient::offline("c1", "ingest", server.uri());
    client.status = MonitorStatus::Online;

    registry.pause(&client).await.unwrap();
}
