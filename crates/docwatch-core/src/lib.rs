//! # docwatch-core
//!
//! Core types, errors, and session state for the docwatch monitor console.
//!
//! This crate provides the foundational data structures shared by the
//! docwatch crates: the monitor fleet domain model (clients, events, sync
//! snapshots, workflow executions), the common error type, centralized
//! default constants, structured-logging field names, and the persisted
//! session/settings store.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    CleanupReport, ConnectionHealth, EventStatus, EventType, ExecutionStatus, MonitorClient,
    MonitorEvent, MonitorStatus, ReconciliationState, RecoveryPolicy, RenamePayload, SyncStatus,
    Workflow, WorkflowExecution,
};
pub use session::{ChatMessage, SessionStore};
