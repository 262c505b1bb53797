//! Ingestion event feed: fetch, repair, filter, paginate.
//!
//! The feed pulls a bounded window of recent events from one plugin, patches
//! missing document correlation ids from sibling events, and exposes the
//! filtered/paginated view plus the destructive per-event commands. All
//! mutations go to the backend and callers re-fetch afterwards; there is no
//! optimistic local state.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use docwatch_core::{defaults, MonitorClient, MonitorEvent, Result};

use crate::http::ApiClient;

/// Event feed client for one or more monitor plugins.
pub struct EventFeed {
    api: Arc<ApiClient>,
}

#[derive(Debug, Deserialize)]
struct RecentEventsResponse {
    #[serde(default)]
    events: Vec<MonitorEvent>,
}

impl EventFeed {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch up to `limit` recent events from `client` and repair missing
    /// correlation ids in the returned window.
    #[instrument(skip(self, client), fields(subsystem = "client", component = "event_feed", op = "fetch_recent", client_id = %client.id))]
    pub async fn fetch_recent(
        &self,
        client: &MonitorClient,
        limit: usize,
    ) -> Result<Vec<MonitorEvent>> {
        let url = format!(
            "{}/monitor/events/recent?limit={}&include_history=true",
            client.endpoint, limit
        );
        let resp: RecentEventsResponse = self.api.get_json(&url).await?;
        let mut events = resp.events;
        let repaired = repair_document_ids(&mut events);
        debug!(result_count = events.len(), repaired, "Event feed refreshed");
        Ok(events)
    }

    /// Delete one event on the backend.
    pub async fn delete_event(&self, client: &MonitorClient, event_id: &str) -> Result<()> {
        self.api
            .delete(&format!("{}/monitor/events/{}", client.endpoint, event_id))
            .await
    }

    /// Ask the backend to retry a failed event. Only meaningful for events
    /// in the error state; the backend rejects others.
    pub async fn retry_event(&self, client: &MonitorClient, event_id: &str) -> Result<()> {
        self.api
            .post_command(&format!(
                "{}/monitor/events/{}/retry",
                client.endpoint, event_id
            ))
            .await
    }

    /// Clear every event held by one plugin.
    pub async fn clear_events(&self, client: &MonitorClient) -> Result<()> {
        self.api
            .delete(&format!("{}/monitor/events/clear", client.endpoint))
            .await
    }

    /// Clear events on every given plugin, stopping at the first failure.
    pub async fn clear_all(&self, clients: &[MonitorClient]) -> Result<()> {
        for client in clients {
            self.clear_events(client).await?;
        }
        info!(result_count = clients.len(), "Cleared events on all clients");
        Ok(())
    }
}

/// Back-fill missing document ids from sibling events, in memory only.
///
/// For every event in a terminal state (`completed`/`duplicate`) without a
/// `document_id`, the most recent other event for the same file name that
/// does carry one donates it by copy. Nothing is written back to the server;
/// the durable fix for the underlying gap belongs in the backend's own
/// document-id propagation.
///
/// Returns the number of events repaired.
pub fn repair_document_ids(events: &mut [MonitorEvent]) -> usize {
    // Best donor per file name: the most recent carrier of a document id.
    let mut donors: HashMap<String, (chrono::DateTime<chrono::Utc>, String)> = HashMap::new();
    for event in events.iter() {
        if let Some(doc_id) = &event.document_id {
            donors
                .entry(event.file_name.clone())
                .and_modify(|(ts, id)| {
                    if event.timestamp > *ts {
                        *ts = event.timestamp;
                        *id = doc_id.clone();
                    }
                })
                .or_insert((event.timestamp, doc_id.clone()));
        }
    }

    let mut repaired = 0;
    for event in events.iter_mut() {
        if event.needs_document_id() {
            if let Some((_, doc_id)) = donors.get(&event.file_name) {
                event.document_id = Some(doc_id.clone());
                repaired += 1;
            }
        }
    }
    repaired
}

// =============================================================================
// FILTERING
// =============================================================================

/// View filter over the fetched event window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Events from every endpoint.
    All,
    /// Events whose folder overlaps one of the given configured folders.
    Folders(Vec<String>),
}

impl EventFilter {
    /// Restrict to a client's configured folders.
    pub fn for_client(client: &MonitorClient) -> Self {
        EventFilter::Folders(client.folders.clone())
    }

    pub fn matches(&self, event: &MonitorEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Folders(folders) => folders
                .iter()
                .any(|f| is_path_prefix(f, &event.folder) || is_path_prefix(&event.folder, f)),
        }
    }
}

/// Path-aware prefix check: `prefix` equals `path` or names one of its
/// ancestors (boundary at a path separator).
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches(['/', '\\']);
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || rest.starts_with('\\'),
        None => false,
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Filtered, paginated view over the fetched event window.
///
/// Pages are 1-indexed and computed over the filtered list. Changing the
/// page size or the filter resets to page 1; replacing the events keeps the
/// current page, clamped to the new page count.
#[derive(Debug)]
pub struct EventView {
    events: Vec<MonitorEvent>,
    filter: EventFilter,
    page: usize,
    page_size: usize,
}

impl EventView {
    pub fn new(events: Vec<MonitorEvent>) -> Self {
        Self {
            events,
            filter: EventFilter::All,
            page: 1,
            page_size: defaults::EVENT_PAGE_SIZE,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Replace the backing events (a poll refresh), clamping the page.
    pub fn set_events(&mut self, events: Vec<MonitorEvent>) {
        self.events = events;
        self.page = self.page.clamp(1, self.page_count().max(1));
    }

    /// Change the filter and reset to page 1.
    pub fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
        self.page = 1;
    }

    /// Change the page size and reset to page 1. Sizes outside the
    /// selectable set are ignored.
    pub fn set_page_size(&mut self, size: usize) {
        if !defaults::EVENT_PAGE_SIZES.contains(&size) {
            debug!(page_size = size, "Ignoring unsupported page size");
            return;
        }
        self.page_size = size;
        self.page = 1;
    }

    /// Jump to a page, clamped to `[1, page_count]`.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count().max(1));
    }

    /// Events passing the current filter, in fetch order.
    pub fn filtered(&self) -> Vec<&MonitorEvent> {
        self.events.iter().filter(|e| self.filter.matches(e)).collect()
    }

    /// Number of pages over the filtered list: `ceil(len / page_size)`.
    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(self.page_size)
    }

    /// The current page of filtered events.
    pub fn page_items(&self) -> Vec<&MonitorEvent> {
        let filtered = self.filtered();
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(filtered.len());
        if start >= filtered.len() {
            return Vec::new();
        }
        filtered[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use docwatch_core::{EventStatus, EventType};

    fn event(id: &str, file: &str, offset_secs: i64, status: EventStatus, doc: Option<&str>) -> MonitorEvent {
        MonitorEvent {
            id: id.to_string(),
            file_name: file.to_string(),
            folder: "/docs/in".to_string(),
            event_type: EventType::Created,
            status,
            document_id: doc.map(String::from),
            timestamp: Utc::now() - Duration::seconds(offset_secs),
            error_message: None,
        }
    }

    // ==========================================================================
    // Document id repair
    // ==========================================================================

    #[test]
    fn test_repair_copies_most_recent_donor() {
        let mut events = vec![
            event("a", "invoice.pdf", 100, EventStatus::Completed, Some("doc1")),
            event("b", "invoice.pdf", 10, EventStatus::Completed, None),
        ];
        let repaired = repair_document_ids(&mut events);
        assert_eq!(repaired, 1);
        assert_eq!(events[1].document_id.as_deref(), Some("doc1"));
    }

    #[test]
    fn test_repair_prefers_newest_of_several_donors() {
        let mut events = vec![
            event("a", "invoice.pdf", 300, EventStatus::Completed, Some("doc-old")),
            event("b", "invoice.pdf", 100, EventStatus::Completed, Some("doc-new")),
            event("c", "invoice.pdf", 10, EventStatus::Duplicate, None),
        ];
        repair_document_ids(&mut events);
        assert_eq!(events[2].document_id.as_deref(), Some("doc-new"));
    }

    #[test]
    fn test_repair_ignores_other_file_names() {
        let mut events = vec![
            event("a", "invoice.pdf", 100, EventStatus::Completed, Some("doc1")),
            event("b", "receipt.pdf", 10, EventStatus::Completed, None),
        ];
        let repaired = repair_document_ids(&mut events);
        assert_eq!(repaired, 0);
        assert_eq!(events[1].document_id, None);
    }

    #[test]
    fn test_repair_leaves_non_terminal_events_alone() {
        let mut events = vec![
            event("a", "invoice.pdf", 100, EventStatus::Completed, Some("doc1")),
            event("b", "invoice.pdf", 10, EventStatus::Pending, None),
            event("c", "invoice.pdf", 5, EventStatus::Error, None),
        ];
        let repaired = repair_document_ids(&mut events);
        assert_eq!(repaired, 0);
        assert_eq!(events[1].document_id, None);
        assert_eq!(events[2].document_id, None);
    }

    #[test]
    fn test_repair_without_donor_stays_absent() {
        let mut events = vec![event("a", "invoice.pdf", 10, EventStatus::Completed, None)];
        assert_eq!(repair_document_ids(&mut events), 0);
        assert_eq!(events[0].document_id, None);
    }

    // ==========================================================================
    // Filtering
    // ==========================================================================

    #[test]
    fn test_path_prefix_both_directions() {
        let filter = EventFilter::Folders(vec!["/docs".to_string()]);
        let mut e = event("a", "x.pdf", 0, EventStatus::Completed, None);

        e.folder = "/docs/in".to_string(); // configured folder is ancestor
        assert!(filter.matches(&e));

        let filter = EventFilter::Folders(vec!["/docs/in/sub".to_string()]);
        e.folder = "/docs/in".to_string(); // event folder is ancestor
        assert!(filter.matches(&e));
    }

    #[test]
    fn test_path_prefix_requires_separator_boundary() {
        let filter = EventFilter::Folders(vec!["/docs".to_string()]);
        let mut e = event("a", "x.pdf", 0, EventStatus::Completed, None);
        e.folder = "/docs-archive".to_string();
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_all_filter_matches_everything() {
        let e = event("a", "x.pdf", 0, EventStatus::Completed, None);
        assert!(EventFilter::All.matches(&e));
    }

    #[test]
    fn test_filter_for_client_uses_configured_folders() {
        let mut client = docwatch_core::MonitorClient::offline("c1", "ingest", "http://h");
        client.folders = vec!["/docs/in".to_string()];
        let filter = EventFilter::for_client(&client);

        let mut e = event("a", "x.pdf", 0, EventStatus::Completed, None);
        assert!(filter.matches(&e));
        e.folder = "/elsewhere".to_string();
        assert!(!filter.matches(&e));
    }

    #[test]
    fn test_is_path_prefix_exact_match() {
        assert!(is_path_prefix("/docs/in", "/docs/in"));
        assert!(is_path_prefix("/docs/in/", "/docs/in"));
        assert!(!is_path_prefix("", "/docs/in"));
    }

    // ==========================================================================
    // Pagination
    // ==========================================================================

    fn view_with(n: usize) -> EventView {
        let events = (0..n)
            .map(|i| event(&format!("e{}", i), "x.pdf", i as i64, EventStatus::Pending, None))
            .collect();
        EventView::new(events)
    }

    #[test]
    fn test_page_count_is_ceiling() {
        let mut view = view_with(23);
        view.set_page_size(10);
        assert_eq!(view.page_count(), 3);

        view.set_page_size(5);
        assert_eq!(view.page_count(), 5);

        let view = view_with(0);
        assert_eq!(view.page_count(), 0);
    }

    #[test]
    fn test_first_page_contents() {
        let mut view = view_with(7);
        view.set_page_size(5);
        let items = view.page_items();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].id, "e0");

        view.set_page(2);
        assert_eq!(view.page_items().len(), 2);
    }

    #[test]
    fn test_first_page_of_short_list() {
        let mut view = view_with(3);
        view.set_page_size(10);
        assert_eq!(view.page_items().len(), 3);
    }

    #[test]
    fn test_page_size_change_resets_to_page_one() {
        let mut view = view_with(50);
        view.set_page(4);
        assert_eq!(view.page(), 4);
        view.set_page_size(20);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_filter_change_resets_to_page_one() {
        let mut view = view_with(50);
        view.set_page(3);
        view.set_filter(EventFilter::Folders(vec!["/docs/in".to_string()]));
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_unsupported_page_size_is_ignored() {
        let mut view = view_with(50);
        view.set_page(3);
        view.set_page_size(7);
        assert_eq!(view.page_size(), defaults::EVENT_PAGE_SIZE);
        assert_eq!(view.page(), 3);
    }

    #[test]
    fn test_refresh_clamps_page() {
        let mut view = view_with(50);
        view.set_page(5);
        view.set_events(
            (0..8)
                .map(|i| event(&format!("e{}", i), "x.pdf", i as i64, EventStatus::Pending, None))
                .collect(),
        );
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_set_page_clamps_to_range() {
        let mut view = view_with(25);
        view.set_page(99);
        assert_eq!(view.page(), 3);
        view.set_page(0);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_pagination_over_filtered_list() {
        let mut events: Vec<MonitorEvent> = (0..30)
            .map(|i| event(&format!("e{}", i), "x.pdf", i as i64, EventStatus::Pending, None))
            .collect();
        for e in events.iter_mut().take(12) {
            e.folder = "/other".to_string();
        }
        let mut view = EventView::new(events);
        view.set_filter(EventFilter::Folders(vec!["/docs/in".to_string()]));
        view.set_page_size(10);
        // 18 events survive the filter.
        assert_eq!(view.page_count(), 2);
        view.set_page(2);
        assert_eq!(view.page_items().len(), 8);
    }
}
