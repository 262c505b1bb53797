//! # docwatch-sync
//!
//! Polling supervisor for the docwatch monitor fleet.
//!
//! This crate provides:
//! - Interval-driven refresh of the fleet roster, event feed, and sync panel
//! - An explicit refresh state machine (idle → refreshing → settling)
//! - Repair command dispatch with settle-then-refetch semantics
//! - Broadcast notifications and graceful shutdown
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docwatch_client::ApiClient;
//! use docwatch_core::SessionStore;
//! use docwatch_sync::{Poller, PollerConfig};
//!
//! let session = Arc::new(SessionStore::from_env()?);
//! let api = Arc::new(ApiClient::from_env(session)?);
//! let poller = Poller::new(api, PollerConfig::from_env());
//!
//! // Start polling and get a handle
//! let handle = poller.start();
//!
//! // Listen for refresh events
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod poller;
pub mod state;

pub use poller::{
    FleetSnapshot, Poller, PollerConfig, PollerEvent, PollerHandle, RefreshScope, RepairCommand,
};
pub use state::{PanelFsm, PanelState};
