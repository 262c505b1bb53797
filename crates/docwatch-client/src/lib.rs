//! # docwatch-client
//!
//! HTTP clients for the docwatch monitor fleet and central backend.
//!
//! This crate provides:
//! - An authenticated [`ApiClient`] wrapper with centralized 401 handling
//! - Fleet discovery and liveness probing ([`MonitorRegistry`])
//! - The ingestion event feed with correlation-id repair, filtering, and
//!   pagination ([`EventFeed`], [`EventView`])
//! - Retention cleanup against the central backend ([`RetentionClient`])
//! - Per-client sync status and repair commands ([`SyncClient`])
//! - Workflow listing/execution with optional run history ([`WorkflowClient`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docwatch_client::{ApiClient, MonitorRegistry};
//! use docwatch_core::SessionStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Arc::new(SessionStore::from_env().unwrap());
//!     let api = Arc::new(ApiClient::from_env(session).unwrap());
//!     let registry = MonitorRegistry::new(api);
//!     let clients = registry.discover().await.unwrap();
//!     for client in clients {
//!         println!("{} is {:?}", client.name, client.status);
//!     }
//! }
//! ```

pub mod events;
pub mod http;
pub mod registry;
pub mod retention;
pub mod sync;
pub mod workflow;

pub use events::{repair_document_ids, EventFeed, EventFilter, EventView};
pub use http::ApiClient;
pub use registry::MonitorRegistry;
pub use retention::RetentionClient;
pub use sync::{CommandOutcome, CommandStatus, SyncClient};
pub use workflow::WorkflowClient;
