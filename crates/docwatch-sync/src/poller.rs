//! Polling supervisor for the monitor fleet.
//!
//! One task owns all three poll cadences: fleet discovery every 30 s, the
//! event feed every 10 s once clients are known, and the sync panel at a
//! selectable interval. Every poll is an idempotent full-state refresh into
//! the shared [`FleetSnapshot`]; ticks never merge, the last fetch wins.
//! Repair commands flow through [`Poller::dispatch_repair`], which drives
//! the panel state machine: command, settle delay, follow-up fetch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::time::{interval, sleep};
use tracing::{debug, info, instrument, warn};

use docwatch_client::sync::CommandOutcome;
use docwatch_client::{ApiClient, EventFeed, MonitorRegistry, SyncClient};
use docwatch_core::{defaults, MonitorClient, MonitorEvent, MonitorStatus, SyncStatus};

use crate::state::PanelFsm;

/// Configuration for the polling supervisor.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Seconds between fleet discovery refreshes.
    pub registry_interval_secs: u64,
    /// Seconds between event feed refreshes.
    pub event_interval_secs: u64,
    /// Seconds between sync panel refreshes. Restricted to the selectable
    /// choices; other values fall back to the default.
    pub sync_interval_secs: u64,
    /// Recent-event window size per feed refresh.
    pub event_limit: usize,
    /// Whether polling runs at all.
    pub enabled: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            registry_interval_secs: defaults::REGISTRY_POLL_INTERVAL_SECS,
            event_interval_secs: defaults::EVENT_POLL_INTERVAL_SECS,
            sync_interval_secs: defaults::SYNC_POLL_INTERVAL_SECS,
            event_limit: defaults::EVENT_FETCH_LIMIT,
            enabled: true,
        }
    }
}

impl PollerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DOCWATCH_POLLER_ENABLED` | `true` | Enable/disable polling |
    /// | `DOCWATCH_REGISTRY_POLL_SECS` | `30` | Fleet discovery cadence |
    /// | `DOCWATCH_EVENT_POLL_SECS` | `10` | Event feed cadence |
    /// | `DOCWATCH_SYNC_POLL_SECS` | `10` | Sync panel cadence (5/10/30/60) |
    /// | `DOCWATCH_EVENT_LIMIT` | `100` | Recent-event window size |
    pub fn from_env() -> Self {
        let enabled = std::env::var("DOCWATCH_POLLER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let registry_interval_secs = std::env::var("DOCWATCH_REGISTRY_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REGISTRY_POLL_INTERVAL_SECS);

        let event_interval_secs = std::env::var("DOCWATCH_EVENT_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::EVENT_POLL_INTERVAL_SECS);

        let sync_interval_secs = std::env::var("DOCWATCH_SYNC_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SYNC_POLL_INTERVAL_SECS);

        let event_limit = std::env::var("DOCWATCH_EVENT_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::EVENT_FETCH_LIMIT);

        Self {
            registry_interval_secs,
            event_interval_secs,
            event_limit,
            enabled,
            ..Self::default()
        }
        .with_sync_interval(sync_interval_secs)
    }

    /// Set the sync panel cadence, falling back to the default for values
    /// outside the selectable choices.
    pub fn with_sync_interval(mut self, secs: u64) -> Self {
        if defaults::SYNC_POLL_CHOICES.contains(&secs) {
            self.sync_interval_secs = secs;
        } else {
            warn!(
                requested = secs,
                fallback = defaults::SYNC_POLL_INTERVAL_SECS,
                "Unsupported sync poll interval"
            );
            self.sync_interval_secs = defaults::SYNC_POLL_INTERVAL_SECS;
        }
        self
    }

    /// Set the recent-event window size.
    pub fn with_event_limit(mut self, limit: usize) -> Self {
        self.event_limit = limit;
        self
    }

    /// Enable or disable polling.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Which poll loop a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    Registry,
    Events,
    Sync,
}

/// Event emitted by the polling supervisor.
#[derive(Debug, Clone)]
pub enum PollerEvent {
    /// The supervisor started.
    Started,
    /// The fleet roster was re-discovered.
    ClientsRefreshed { count: usize },
    /// The event feed was refreshed for a client.
    EventsRefreshed { client_id: String, count: usize },
    /// The sync panel was refreshed for the selected client.
    SyncRefreshed { client_id: String, connected: bool },
    /// A repair command settled and its follow-up fetch completed.
    CommandSettled { client_id: String, command: String },
    /// A poll failed; the loop keeps going.
    RefreshFailed { scope: RefreshScope, error: String },
    /// The supervisor stopped.
    Stopped,
}

/// Imperative repair command against the selected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairCommand {
    /// Re-sync one folder against the filesystem.
    Reconcile { folder: String },
    /// Flush buffered-but-unsent events.
    ForceSync,
    /// Re-announce the client to the central registry.
    ForceRegister,
    /// Re-emit created events for every file in every monitored folder.
    RescanAll,
    /// Deduplicate/unstick the plugin's event queue.
    CleanEvents,
}

impl RepairCommand {
    pub fn label(&self) -> &'static str {
        match self {
            RepairCommand::Reconcile { .. } => "reconcile",
            RepairCommand::ForceSync => "force-sync",
            RepairCommand::ForceRegister => "register",
            RepairCommand::RescanAll => "rescan",
            RepairCommand::CleanEvents => "clean-events",
        }
    }
}

/// Last-fetch-wins view of the fleet, shared with observers.
#[derive(Debug, Default, Clone)]
pub struct FleetSnapshot {
    pub clients: Vec<MonitorClient>,
    pub events: Vec<MonitorEvent>,
    pub sync: Option<SyncStatus>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Handle for controlling a running poller.
pub struct PollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<PollerEvent>,
}

impl PollerHandle {
    /// Signal the poller to shut down gracefully.
    pub async fn shutdown(&self) -> docwatch_core::Result<()> {
        self.shutdown_tx.send(()).await.map_err(|_| {
            docwatch_core::Error::Internal("Failed to send shutdown signal".into())
        })?;
        Ok(())
    }

    /// Get a receiver for poller events.
    pub fn events(&self) -> broadcast::Receiver<PollerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Polling supervisor over the discovery, event feed, and sync clients.
#[derive(Clone)]
pub struct Poller {
    config: PollerConfig,
    registry: Arc<MonitorRegistry>,
    feed: Arc<EventFeed>,
    sync: Arc<SyncClient>,
    event_tx: broadcast::Sender<PollerEvent>,
    snapshot: Arc<RwLock<FleetSnapshot>>,
    selected: Arc<RwLock<Option<MonitorClient>>>,
    fsm: Arc<Mutex<PanelFsm>>,
}

impl Poller {
    /// Create a new poller over the given API client.
    pub fn new(api: Arc<ApiClient>, config: PollerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            config,
            registry: Arc::new(MonitorRegistry::new(api.clone())),
            feed: Arc::new(EventFeed::new(api.clone())),
            sync: Arc::new(SyncClient::new(api)),
            event_tx,
            snapshot: Arc::new(RwLock::new(FleetSnapshot::default())),
            selected: Arc::new(RwLock::new(None)),
            fsm: Arc::new(Mutex::new(PanelFsm::new())),
        }
    }

    /// Swap in a pre-configured sync client (shorter settle delay in tests).
    pub fn with_sync_client(mut self, sync: SyncClient) -> Self {
        self.sync = Arc::new(sync);
        self
    }

    /// Get a receiver for poller events.
    pub fn events(&self) -> broadcast::Receiver<PollerEvent> {
        self.event_tx.subscribe()
    }

    /// The shared fleet snapshot.
    pub async fn snapshot(&self) -> FleetSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Select the client whose sync panel is polled. Returns `false` when
    /// the id is not in the current roster.
    pub async fn select_client(&self, client_id: &str) -> bool {
        let found = {
            let snapshot = self.snapshot.read().await;
            snapshot.clients.iter().find(|c| c.id == client_id).cloned()
        };
        let selected = found.is_some();
        *self.selected.write().await = found;
        selected
    }

    /// Currently selected client, if any.
    pub async fn selected_client(&self) -> Option<MonitorClient> {
        self.selected.read().await.clone()
    }

    /// Start the poll loops and return a handle for control.
    pub fn start(&self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let poller = self.clone();
        tokio::spawn(async move {
            poller.run(&mut shutdown_rx).await;
        });

        PollerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "sync", component = "poller"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Poller is disabled, not starting");
            return;
        }

        info!(
            registry_secs = self.config.registry_interval_secs,
            event_secs = self.config.event_interval_secs,
            sync_secs = self.config.sync_interval_secs,
            "Poller started"
        );
        let _ = self.event_tx.send(PollerEvent::Started);

        // Each interval fires immediately on its first tick, so discovery
        // seeds the roster before the event/sync loops have work to skip.
        let mut registry_tick = interval(Duration::from_secs(self.config.registry_interval_secs));
        let mut event_tick = interval(Duration::from_secs(self.config.event_interval_secs));
        let mut sync_tick = interval(Duration::from_secs(self.config.sync_interval_secs));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Poller received shutdown signal");
                    break;
                }
                _ = registry_tick.tick() => self.refresh_clients().await,
                _ = event_tick.tick() => self.refresh_events().await,
                _ = sync_tick.tick() => self.refresh_sync().await,
            }
        }

        let _ = self.event_tx.send(PollerEvent::Stopped);
        info!("Poller stopped");
    }

    /// Re-discover the fleet and carry the selection over to the fresh
    /// roster (dropping it when the client vanished).
    async fn refresh_clients(&self) {
        match self.registry.discover().await {
            Ok(clients) => {
                let count = clients.len();
                {
                    let mut selected = self.selected.write().await;
                    if let Some(current) = selected.as_ref() {
                        *selected = clients.iter().find(|c| c.id == current.id).cloned();
                    }
                }
                {
                    let mut snapshot = self.snapshot.write().await;
                    snapshot.clients = clients;
                    snapshot.refreshed_at = Some(Utc::now());
                }
                let _ = self.event_tx.send(PollerEvent::ClientsRefreshed { count });
            }
            Err(e) => {
                warn!(error = %e, "Fleet discovery failed");
                let _ = self.event_tx.send(PollerEvent::RefreshFailed {
                    scope: RefreshScope::Registry,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Refresh the event feed from the selected client, falling back to the
    /// first reachable one.
    async fn refresh_events(&self) {
        let client = match self.feed_source().await {
            Some(client) => client,
            None => {
                debug!("No reachable client, skipping event refresh");
                return;
            }
        };

        match self.feed.fetch_recent(&client, self.config.event_limit).await {
            Ok(events) => {
                let count = events.len();
                {
                    let mut snapshot = self.snapshot.write().await;
                    snapshot.events = events;
                }
                let _ = self.event_tx.send(PollerEvent::EventsRefreshed {
                    client_id: client.id,
                    count,
                });
            }
            Err(e) => {
                warn!(client_id = %client.id, error = %e, "Event refresh failed");
                let _ = self.event_tx.send(PollerEvent::RefreshFailed {
                    scope: RefreshScope::Events,
                    error: e.to_string(),
                });
            }
        }
    }

    async fn feed_source(&self) -> Option<MonitorClient> {
        if let Some(client) = self.selected.read().await.clone() {
            if client.status != MonitorStatus::Offline {
                return Some(client);
            }
        }
        self.snapshot
            .read()
            .await
            .clients
            .iter()
            .find(|c| c.status != MonitorStatus::Offline)
            .cloned()
    }

    /// Refresh the sync panel for the selected client. Skipped while the
    /// panel is settling after a command or a refresh is already in flight.
    async fn refresh_sync(&self) {
        let client = match self.selected.read().await.clone() {
            Some(client) => client,
            None => return,
        };
        if client.status == MonitorStatus::Offline {
            debug!(client_id = %client.id, "Client offline, sync panel idle");
            return;
        }
        if !self.fsm.lock().await.begin_refresh() {
            debug!(client_id = %client.id, "Panel busy, skipping sync tick");
            return;
        }

        let result = self.sync.fetch_status(&client.endpoint).await;
        self.fsm.lock().await.finish_refresh();

        match result {
            Ok(status) => {
                let connected = status.connection.connected;
                {
                    let mut snapshot = self.snapshot.write().await;
                    snapshot.sync = Some(status);
                }
                let _ = self.event_tx.send(PollerEvent::SyncRefreshed {
                    client_id: client.id,
                    connected,
                });
            }
            Err(e) => {
                warn!(client_id = %client.id, error = %e, "Sync refresh failed");
                let _ = self.event_tx.send(PollerEvent::RefreshFailed {
                    scope: RefreshScope::Sync,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Run a repair command against the selected client, wait out the
    /// settle delay, and fold the follow-up status fetch into the snapshot.
    ///
    /// Offline clients accept only [`RepairCommand::ForceRegister`].
    #[instrument(skip(self), fields(subsystem = "sync", component = "poller", op = "dispatch_repair"))]
    pub async fn dispatch_repair(&self, command: RepairCommand) -> CommandOutcome {
        let client = match self.selected.read().await.clone() {
            Some(client) => client,
            None => return CommandOutcome::error("no client selected"),
        };
        if client.status == MonitorStatus::Offline
            && command != RepairCommand::ForceRegister
        {
            return CommandOutcome::error(format!(
                "{} is offline; only registration is available",
                client.name
            ));
        }

        self.fsm.lock().await.command_dispatched();

        let outcome = match &command {
            RepairCommand::Reconcile { folder } => to_outcome(
                self.sync.force_reconcile(&client.endpoint, folder).await,
                "Reconciliation requested",
            ),
            RepairCommand::ForceSync => to_outcome(
                self.sync.force_sync(&client.endpoint).await,
                "Event sync requested",
            ),
            RepairCommand::ForceRegister => to_outcome(
                self.sync.force_register(&client.endpoint).await,
                "Registration requested",
            ),
            RepairCommand::RescanAll => self.sync.rescan_all(&client.endpoint).await,
            RepairCommand::CleanEvents => self.sync.clean_events(&client.endpoint).await,
        };

        // Settle, then observe the effect with a fresh fetch.
        sleep(self.sync.settle_delay()).await;
        self.fsm.lock().await.settle_elapsed();

        match self.sync.fetch_status(&client.endpoint).await {
            Ok(status) => {
                let mut snapshot = self.snapshot.write().await;
                snapshot.sync = Some(status);
            }
            Err(e) => {
                warn!(client_id = %client.id, error = %e, "Post-command refresh failed");
            }
        }
        self.fsm.lock().await.finish_refresh();

        let _ = self.event_tx.send(PollerEvent::CommandSettled {
            client_id: client.id,
            command: command.label().to_string(),
        });
        outcome
    }
}

fn to_outcome(result: docwatch_core::Result<()>, ok_message: &str) -> CommandOutcome {
    match result {
        Ok(()) => CommandOutcome::ok(ok_message),
        Err(e) => CommandOutcome::error(e.to_string()),
    }
}
