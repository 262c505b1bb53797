//! Monitor client discovery and liveness probing.
//!
//! The central backend keeps its own bookkeeping of registered monitor
//! plugins; this module trusts it only for the roster. Live status always
//! comes from probing each plugin directly at `{endpoint}/monitor/status`,
//! so a stale registry entry cannot make a dead plugin look healthy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use docwatch_core::{defaults, MonitorClient, MonitorStatus, Result};

use crate::http::ApiClient;

/// Discovery and command surface for the monitor plugin fleet.
pub struct MonitorRegistry {
    api: Arc<ApiClient>,
}

/// Roster entry as reported by the central backend.
#[derive(Debug, Clone, Deserialize)]
struct RegisteredPlugin {
    id: String,
    #[serde(default)]
    name: Option<String>,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct PluginListResponse {
    #[serde(default)]
    plugins: Vec<RegisteredPlugin>,
}

/// Live status reported by a plugin's own status endpoint.
#[derive(Debug, Deserialize)]
struct ProbeResponse {
    is_running: bool,
    #[serde(default)]
    monitoring_folders: Vec<String>,
    #[serde(default)]
    autostart_folders: Vec<String>,
}

#[derive(Serialize)]
struct StartRequest<'a> {
    folder_paths: &'a [String],
}

#[derive(Serialize)]
struct FolderRequest<'a> {
    folder_path: &'a str,
}

#[derive(Serialize)]
struct AutostartRequest<'a> {
    folder_path: &'a str,
    autostart: bool,
}

impl MonitorRegistry {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the registered plugin roster and probe every entry concurrently.
    ///
    /// Entries whose probe fails (after the single bounded retry) come back
    /// as `Offline` with empty folder lists; the call itself only fails when
    /// the roster fetch fails.
    #[instrument(skip(self), fields(subsystem = "client", component = "registry", op = "discover"))]
    pub async fn discover(&self) -> Result<Vec<MonitorClient>> {
        let url = self.api.central_url("/api/document-monitor/clients");
        let roster: PluginListResponse = self.api.get_json(&url).await?;

        let probes = roster
            .plugins
            .into_iter()
            .map(|plugin| self.resolve_client(plugin));
        let clients = join_all(probes).await;

        info!(result_count = clients.len(), "Discovery complete");
        Ok(clients)
    }

    /// Probe one plugin and derive its [`MonitorClient`] record.
    pub async fn probe_client(&self, id: &str, name: &str, endpoint: &str) -> MonitorClient {
        self.resolve_client(RegisteredPlugin {
            id: id.to_string(),
            name: Some(name.to_string()),
            endpoint: endpoint.to_string(),
        })
        .await
    }

    async fn resolve_client(&self, plugin: RegisteredPlugin) -> MonitorClient {
        let name = plugin.name.clone().unwrap_or_else(|| plugin.id.clone());
        let start = Instant::now();

        match self.probe_with_retry(&plugin.endpoint).await {
            Ok(probe) => {
                let status = if probe.is_running {
                    MonitorStatus::Online
                } else {
                    MonitorStatus::Paused
                };
                debug!(
                    client_id = %plugin.id,
                    endpoint = %plugin.endpoint,
                    ?status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Probe succeeded"
                );
                MonitorClient {
                    id: plugin.id,
                    name,
                    endpoint: plugin.endpoint,
                    status,
                    folders: probe.monitoring_folders,
                    autostart_folders: probe.autostart_folders,
                }
            }
            Err(e) => {
                warn!(
                    client_id = %plugin.id,
                    endpoint = %plugin.endpoint,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Probe failed after retry, marking offline"
                );
                MonitorClient::offline(plugin.id, name, plugin.endpoint)
            }
        }
    }

    /// Probe with one immediate retry after a fixed delay.
    ///
    /// Plugins may be mid-startup when the roster lists them; the single
    /// bounded retry absorbs that race without blocking discovery.
    async fn probe_with_retry(&self, endpoint: &str) -> Result<ProbeResponse> {
        match self.probe_once(endpoint).await {
            Ok(probe) => Ok(probe),
            Err(first) => {
                debug!(endpoint, error = %first, "Probe failed, retrying once");
                sleep(Duration::from_millis(defaults::PROBE_RETRY_DELAY_MS)).await;
                self.probe_once(endpoint).await
            }
        }
    }

    async fn probe_once(&self, endpoint: &str) -> Result<ProbeResponse> {
        self.api
            .get_json_timeout(
                &format!("{}/monitor/status", endpoint),
                Duration::from_millis(defaults::STATUS_PROBE_TIMEOUT_MS),
            )
            .await
    }

    // ========================================================================
    // Monitor commands
    // ========================================================================

    /// Start monitoring with the client's current folder list.
    #[instrument(skip(self, client), fields(subsystem = "client", component = "registry", op = "start", client_id = %client.id))]
    pub async fn start(&self, client: &MonitorClient) -> Result<()> {
        self.api
            .post_body(
                &format!("{}/monitor/start", client.endpoint),
                &StartRequest {
                    folder_paths: &client.folders,
                },
            )
            .await
    }

    /// Stop monitoring.
    #[instrument(skip(self, client), fields(subsystem = "client", component = "registry", op = "stop", client_id = %client.id))]
    pub async fn stop(&self, client: &MonitorClient) -> Result<()> {
        self.api
            .post_command(&format!("{}/monitor/stop", client.endpoint))
            .await
    }

    /// Pause monitoring.
    ///
    /// The plugin exposes no distinct pause primitive; pause is an alias
    /// for [`stop`](Self::stop) and must stay one.
    pub async fn pause(&self, client: &MonitorClient) -> Result<()> {
        self.stop(client).await
    }

    /// Add a folder to the client's configuration.
    pub async fn add_folder(&self, client: &MonitorClient, folder: &str) -> Result<()> {
        self.api
            .post_body(
                &format!("{}/monitor/configure", client.endpoint),
                &FolderRequest { folder_path: folder },
            )
            .await
    }

    /// Remove a folder from the client's configuration.
    pub async fn remove_folder(&self, client: &MonitorClient, folder: &str) -> Result<()> {
        self.api
            .post_body(
                &format!("{}/monitor/remove_folder", client.endpoint),
                &FolderRequest { folder_path: folder },
            )
            .await
    }

    /// Toggle per-folder autostart.
    pub async fn set_autostart(
        &self,
        client: &MonitorClient,
        folder: &str,
        autostart: bool,
    ) -> Result<()> {
        self.api
            .post_body(
                &format!("{}/monitor/autostart", client.endpoint),
                &AutostartRequest {
                    folder_path: folder,
                    autostart,
                },
            )
            .await
    }
}
