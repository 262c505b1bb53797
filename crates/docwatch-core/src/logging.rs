//! Structured logging schema and field name constants for docwatch.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, skipped refreshes |
//! | TRACE | Per-item iteration, high-volume data (event rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "client", "sync", "session"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "registry", "event_feed", "sync_panel", "poller"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "discover", "probe", "fetch_recent", "rescan_all"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Monitor client identifier assigned by the registry.
pub const CLIENT_ID: &str = "client_id";

/// Monitor plugin base URL.
pub const ENDPOINT: &str = "endpoint";

/// Monitored folder path.
pub const FOLDER: &str = "folder";

/// Monitor event identifier.
pub const EVENT_ID: &str = "event_id";

/// Workflow identifier.
pub const WORKFLOW_ID: &str = "workflow_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned by a fetch.
pub const RESULT_COUNT: &str = "result_count";

/// Current page of a paginated view.
pub const PAGE: &str = "page";

/// Page size of a paginated view.
pub const PAGE_SIZE: &str = "page_size";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
