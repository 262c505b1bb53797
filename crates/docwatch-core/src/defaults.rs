//! Centralized default constants for the docwatch system.
//!
//! **This module is the single source of truth** for all shared default
//! values. The client and sync crates reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// LIVENESS PROBES
// =============================================================================

/// Timeout for a single plugin status probe in milliseconds.
pub const STATUS_PROBE_TIMEOUT_MS: u64 = 2_500;

/// Fixed delay before the single probe retry in milliseconds.
///
/// Plugins may be mid-startup when probed; one bounded retry absorbs that
/// race without blocking the console. Worst case per client is
/// probe timeout + retry delay + probe timeout (~5.5 s).
pub const PROBE_RETRY_DELAY_MS: u64 = 500;

// =============================================================================
// REPAIR COMMANDS
// =============================================================================

/// Delay between a repair command and its follow-up status re-fetch,
/// in milliseconds. Gives the plugin time to settle before re-polling.
pub const COMMAND_SETTLE_DELAY_MS: u64 = 1_500;

/// Timeout for long-running repair commands (rescan, clean-events) in seconds.
pub const LONG_COMMAND_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// POLLING
// =============================================================================

/// Interval between fleet discovery refreshes in seconds.
pub const REGISTRY_POLL_INTERVAL_SECS: u64 = 30;

/// Interval between event feed refreshes in seconds.
pub const EVENT_POLL_INTERVAL_SECS: u64 = 10;

/// Default interval between sync status refreshes in seconds.
pub const SYNC_POLL_INTERVAL_SECS: u64 = 10;

/// Selectable sync status refresh intervals in seconds.
pub const SYNC_POLL_CHOICES: [u64; 4] = [5, 10, 30, 60];

// =============================================================================
// EVENT FEED
// =============================================================================

/// Default number of recent events fetched per refresh.
pub const EVENT_FETCH_LIMIT: usize = 100;

/// Default event page size.
pub const EVENT_PAGE_SIZE: usize = 10;

/// Selectable event page sizes.
pub const EVENT_PAGE_SIZES: [usize; 5] = [5, 10, 20, 50, 100];

// =============================================================================
// RETENTION
// =============================================================================

/// Maximum event age retained by the cleanup policy, in hours.
pub const CLEANUP_MAX_AGE_HOURS: u32 = 24;

/// Maximum number of events retained by the cleanup policy.
pub const CLEANUP_MAX_EVENTS: u32 = 1_000;

// =============================================================================
// HTTP
// =============================================================================

/// Default request timeout for ordinary calls in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default central backend base URL.
pub const BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Threshold above which a completed HTTP round-trip is logged as slow,
/// in milliseconds.
pub const SLOW_HTTP_WARN_MS: u64 = 2_000;

// =============================================================================
// CHAT SESSION
// =============================================================================

/// Default cap on stored chat interactions.
pub const MAX_INTERACTIONS: u32 = 10;
