//! Per-client synchronization status and repair commands.
//!
//! Every repair command POSTs straight to the plugin endpoint and is
//! fire-and-forget: no optimistic state change, no client-side dedup of
//! concurrent identical commands (the plugin serializes them). Callers
//! observe the effect through the delayed status re-fetch.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use docwatch_core::{defaults, Error, Result, SyncStatus};

use crate::http::ApiClient;

/// Result of a long-running repair command, resolved rather than thrown so
/// a timeout can be told apart from a generic failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub status: CommandStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Error,
}

impl CommandOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CommandStatus::Ok
    }
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Sync status fetches and repair commands against one plugin endpoint.
pub struct SyncClient {
    api: Arc<ApiClient>,
    settle_delay: Duration,
    long_command_timeout: Duration,
}

impl SyncClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            settle_delay: Duration::from_millis(defaults::COMMAND_SETTLE_DELAY_MS),
            long_command_timeout: Duration::from_secs(defaults::LONG_COMMAND_TIMEOUT_SECS),
        }
    }

    /// Override the post-command settle delay. Intended for tests.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Override the rescan/clean timeout. Intended for tests.
    pub fn with_long_command_timeout(mut self, timeout: Duration) -> Self {
        self.long_command_timeout = timeout;
        self
    }

    /// The delay observed between a command and its follow-up fetch.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Fetch the plugin's current synchronization snapshot.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "fetch_status"))]
    pub async fn fetch_status(&self, endpoint: &str) -> Result<SyncStatus> {
        let status: SyncStatus = self
            .api
            .get_json(&format!("{}/monitor/sync-status", endpoint))
            .await?;
        debug!(
            connected = status.connection.connected,
            running = status.reconciliation.running,
            result_count = status.reconciliation.active_folders.len(),
            "Sync status refreshed"
        );
        Ok(status)
    }

    /// Re-fetch the status after the settle delay, giving the plugin time
    /// to act on a just-issued command before the next observation.
    pub async fn refresh_after_command(&self, endpoint: &str) -> Result<SyncStatus> {
        sleep(self.settle_delay).await;
        self.fetch_status(endpoint).await
    }

    // ========================================================================
    // Repair commands
    // ========================================================================

    /// Re-sync one folder against the filesystem.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "force_reconcile"))]
    pub async fn force_reconcile(&self, endpoint: &str, folder: &str) -> Result<()> {
        self.api
            .post_command_query(
                &format!("{}/monitor/reconcile", endpoint),
                &[("folder_path", folder)],
            )
            .await
    }

    /// Flush buffered-but-unsent events.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "force_sync"))]
    pub async fn force_sync(&self, endpoint: &str) -> Result<()> {
        self.api
            .post_command(&format!("{}/monitor/force-sync", endpoint))
            .await
    }

    /// Re-announce the plugin to the central registry. The one command that
    /// stays available while the client is offline.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "force_register"))]
    pub async fn force_register(&self, endpoint: &str) -> Result<()> {
        self.api
            .post_command(&format!("{}/monitor/register", endpoint))
            .await
    }

    /// Re-emit `created` events for every file in every monitored folder,
    /// already-seen ones included.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "rescan_all"))]
    pub async fn rescan_all(&self, endpoint: &str) -> CommandOutcome {
        self.long_command(&format!("{}/monitor/rescan_all", endpoint), "Rescan")
            .await
    }

    /// Ask the plugin to deduplicate and unstick its event queue.
    #[instrument(skip(self), fields(subsystem = "client", component = "sync_panel", op = "clean_events"))]
    pub async fn clean_events(&self, endpoint: &str) -> CommandOutcome {
        self.long_command(&format!("{}/monitor/clean-events", endpoint), "Clean")
            .await
    }

    async fn long_command(&self, url: &str, label: &str) -> CommandOutcome {
        match self
            .api
            .post_parse_timeout::<CommandResponse>(url, self.long_command_timeout)
            .await
        {
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| format!("{} completed", label));
                info!(url, "Command completed");
                CommandOutcome::ok(message)
            }
            Err(Error::Timeout(e)) => {
                warn!(url, error = %e, "Command timed out");
                CommandOutcome::error(format!(
                    "Timeout after {}s: {}",
                    self.long_command_timeout.as_secs(),
                    e
                ))
            }
            Err(e) => {
                warn!(url, error = %e, "Command failed");
                CommandOutcome::error(e.to_string())
            }
        }
    }
}
