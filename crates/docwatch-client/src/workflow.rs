//! Workflow listing, execution, and recent-run history.
//!
//! The workflow list is load-bearing: a failed fetch surfaces to the caller
//! as a page-level error. The recent-execution history is not; backends
//! without the history endpoint are common, so any failure there degrades
//! to an empty history.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use docwatch_core::{Result, Workflow, WorkflowExecution};

use crate::http::ApiClient;

/// Workflow viewer client against the central backend.
pub struct WorkflowClient {
    api: Arc<ApiClient>,
}

#[derive(Debug, Deserialize)]
struct WorkflowListResponse {
    #[serde(default)]
    workflows: Vec<Workflow>,
}

#[derive(Debug, Deserialize)]
struct RecentExecutionsResponse {
    #[serde(default)]
    executions: Vec<WorkflowExecution>,
}

impl WorkflowClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// List the workflows known to the backend.
    #[instrument(skip(self), fields(subsystem = "client", component = "workflow", op = "list"))]
    pub async fn list(&self) -> Result<Vec<Workflow>> {
        let resp: WorkflowListResponse =
            self.api.get_json(&self.api.central_url("/api/workflows")).await?;
        debug!(result_count = resp.workflows.len(), "Workflow list refreshed");
        Ok(resp.workflows)
    }

    /// Trigger one run of a workflow.
    #[instrument(skip(self), fields(subsystem = "client", component = "workflow", op = "execute"))]
    pub async fn execute(&self, workflow_id: &str) -> Result<WorkflowExecution> {
        let execution: WorkflowExecution = self
            .api
            .post_parse(&self.api.central_url(&format!("/api/workflows/{}/execute", workflow_id)))
            .await?;
        info!(
            workflow_id,
            execution_id = %execution.execution_id,
            "Workflow execution started"
        );
        Ok(execution)
    }

    /// Recent execution history. Optional: any failure (missing endpoint,
    /// network error) yields an empty history instead of an error.
    #[instrument(skip(self), fields(subsystem = "client", component = "workflow", op = "recent_executions"))]
    pub async fn recent_executions(&self) -> Vec<WorkflowExecution> {
        let url = self.api.central_url("/api/workflow-monitor/executions/recent");
        match self.api.get_json::<RecentExecutionsResponse>(&url).await {
            Ok(resp) => resp.executions,
            Err(e) => {
                debug!(error = %e, "Recent executions unavailable, showing empty history");
                Vec::new()
            }
        }
    }
}
