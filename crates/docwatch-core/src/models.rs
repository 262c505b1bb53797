//! Core data models for docwatch.
//!
//! These types are shared across the docwatch crates and represent the
//! monitor fleet domain: clients, ingestion events, synchronization
//! snapshots, and workflow executions. All of them are rebuilt from remote
//! responses on every refresh; none are persisted locally.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// MONITOR CLIENTS
// =============================================================================

/// Liveness state of a monitor plugin as derived from its status probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Online,
    Paused,
    Offline,
}

/// A remote document-monitor plugin instance.
///
/// Identity (`id`) is assigned by the central registry and is stable only
/// within one discovery response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorClient {
    pub id: String,
    pub name: String,
    /// Base URL of the plugin's own HTTP surface.
    pub endpoint: String,
    pub status: MonitorStatus,
    /// Configured folders, in the order the plugin reports them.
    pub folders: Vec<String>,
    /// Folders that resume watching automatically on plugin restart.
    pub autostart_folders: Vec<String>,
}

impl MonitorClient {
    /// Build the fallback record for a plugin whose probe failed twice.
    pub fn offline(id: impl Into<String>, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: endpoint.into(),
            status: MonitorStatus::Offline,
            folders: Vec::new(),
            autostart_folders: Vec::new(),
        }
    }

    /// The start action is available whenever the plugin is not running.
    pub fn can_start(&self) -> bool {
        self.status != MonitorStatus::Online
    }

    /// The pause action is available only while the plugin is running.
    pub fn can_pause(&self) -> bool {
        self.status == MonitorStatus::Online
    }

    /// The stop action is available only while the plugin is running.
    pub fn can_stop(&self) -> bool {
        self.status == MonitorStatus::Online
    }
}

// =============================================================================
// MONITOR EVENTS
// =============================================================================

/// Filesystem change kind reported by a monitor plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Deleted,
    Renamed,
    Moved,
    PathChanged,
    /// Event types introduced by newer plugins deserialize here.
    #[serde(other)]
    Unknown,
}

impl EventType {
    /// Whether the event's `error_message` carries a rename payload
    /// instead of an actual error.
    pub fn is_rename_like(self) -> bool {
        matches!(self, EventType::Renamed | EventType::Moved | EventType::PathChanged)
    }
}

/// Processing state of a monitor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Processing,
    Completed,
    Error,
    Duplicate,
}

/// Old and new path of a rename/move event, normalized from either of the
/// two payload shapes plugins emit (`{from,to}` or `{old_name,new_name}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePayload {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
struct RawRenamePayload {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    old_name: Option<String>,
    #[serde(default)]
    new_name: Option<String>,
}

/// One file-system ingestion event reported by a monitor plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    pub id: String,
    pub file_name: String,
    pub folder: String,
    pub event_type: EventType,
    pub status: EventStatus,
    /// Correlation id into the document store. May be missing for
    /// completed events; see the feed's repair pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Error text for failed events. For rename-like events this holds a
    /// JSON `{from,to}` or `{old_name,new_name}` payload, not an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MonitorEvent {
    /// True when this event should receive a correlation id from a sibling
    /// event during the feed's repair pass.
    pub fn needs_document_id(&self) -> bool {
        matches!(self.status, EventStatus::Completed | EventStatus::Duplicate)
            && self.document_id.is_none()
    }

    /// Parse the rename payload carried in `error_message`.
    ///
    /// Returns `None` for non-rename events, absent messages, and payloads
    /// that do not decode to either known shape.
    pub fn rename_payload(&self) -> Option<RenamePayload> {
        if !self.event_type.is_rename_like() {
            return None;
        }
        let raw: RawRenamePayload = serde_json::from_str(self.error_message.as_deref()?).ok()?;
        match (raw.from, raw.to, raw.old_name, raw.new_name) {
            (Some(from), Some(to), _, _) => Some(RenamePayload { from, to }),
            (_, _, Some(from), Some(to)) => Some(RenamePayload { from, to }),
            _ => None,
        }
    }
}

// =============================================================================
// SYNC STATUS
// =============================================================================

/// Connection health of a plugin's link to the central backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionHealth {
    pub connected: bool,
    #[serde(default)]
    pub consecutive_successes: u32,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub last_connected: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_disconnected: Option<DateTime<Utc>>,
    /// Length of the current/most recent disconnection, in seconds.
    #[serde(default)]
    pub disconnection_duration_secs: Option<f64>,
}

/// State of a plugin's reconciliation scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationState {
    pub running: bool,
    pub sync_interval_secs: u64,
    /// Last completed reconciliation per folder.
    #[serde(default)]
    pub last_sync: HashMap<String, DateTime<Utc>>,
    /// Folders currently monitored and included in periodic reconciliation.
    #[serde(default)]
    pub active_folders: Vec<String>,
}

impl ReconciliationState {
    /// A folder is active iff it is present in `active_folders`.
    pub fn is_folder_active(&self, folder: &str) -> bool {
        self.active_folders.iter().any(|f| f == folder)
    }
}

/// Recovery behavior configured on the plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    pub enabled: bool,
    pub auto_reconcile: bool,
}

/// Snapshot of one plugin's synchronization subsystem.
///
/// Ephemeral: re-fetched on every poll tick or manual refresh, never cached
/// beyond the current snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub connection: ConnectionHealth,
    pub reconciliation: ReconciliationState,
    pub recovery: RecoveryPolicy,
}

// =============================================================================
// WORKFLOWS
// =============================================================================

/// Workflow summary as listed by the central backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Terminal and non-terminal states of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// One run of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub execution_id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkflowExecution {
    /// Elapsed run time as of `now`. Running entries measure against `now`
    /// at read time; completed entries against their completion timestamp.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }

    /// Human-readable duration: `"42s"` under a minute, `"3m 12s"` above.
    pub fn duration_label(&self, now: DateTime<Utc>) -> String {
        let secs = self.duration_at(now).num_seconds().max(0);
        if secs < 60 {
            format!("{}s", secs)
        } else {
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

// =============================================================================
// RETENTION
// =============================================================================

/// Deletion counters returned by the backend retention cleanup call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub initial_count: u64,
    pub deleted_by_age: u64,
    pub deleted_by_count: u64,
    pub final_count: u64,
}

impl CleanupReport {
    /// True once the retention bounds are satisfied and a repeat call
    /// deleted nothing further.
    pub fn is_converged(&self) -> bool {
        self.deleted_by_age == 0 && self.deleted_by_count == 0
    }
}
