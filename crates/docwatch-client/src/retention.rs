//! Event retention cleanup.
//!
//! The central backend bounds event storage by both age and count; this
//! module only triggers the pruning call and hands back the deletion
//! counters. The call is idempotent: once the bounds are satisfied, a
//! repeat invocation reports zero further deletions.

use std::sync::Arc;

use tracing::{info, instrument};

use docwatch_core::{defaults, CleanupReport, Result};

use crate::http::ApiClient;

/// Retention policy trigger against the central backend.
pub struct RetentionClient {
    api: Arc<ApiClient>,
}

impl RetentionClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Prune events older than `max_age_hours` and beyond `max_events`,
    /// returning the backend's deletion counters.
    #[instrument(skip(self), fields(subsystem = "client", component = "retention", op = "cleanup"))]
    pub async fn cleanup(&self, max_age_hours: u32, max_events: u32) -> Result<CleanupReport> {
        let url = self
            .api
            .central_url("/api/database-management/pdf-events/cleanup");
        let max_age = max_age_hours.to_string();
        let max = max_events.to_string();
        let report: CleanupReport = self
            .api
            .post_query_parse(
                &url,
                &[("max_age_hours", max_age.as_str()), ("max_events", max.as_str())],
            )
            .await?;
        info!(
            initial = report.initial_count,
            by_age = report.deleted_by_age,
            by_count = report.deleted_by_count,
            remaining = report.final_count,
            "Retention cleanup complete"
        );
        Ok(report)
    }

    /// Cleanup with the console's standing bounds (24 h / 1000 events).
    pub async fn cleanup_default(&self) -> Result<CleanupReport> {
        self.cleanup(defaults::CLEANUP_MAX_AGE_HOURS, defaults::CLEANUP_MAX_EVENTS)
            .await
    }
}
