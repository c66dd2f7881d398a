//! The authoritative in-memory snapshot of projects, plus the view state
//! (selection, filters, sort, loading and error flags) that goes with it.
//!
//! Every mutation is synchronous and publishes a [`StoreEvent`] so views can
//! re-render without polling.

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::filtering;
use super::models::{
    FilterCriteria, ProjectId, ProjectPatch, ProjectRecord, SortSpec, SummaryStats,
};
use super::summary::summarize;

const EVENT_CAPACITY: usize = 64;

/// Shared handle to a store, created once at the composition root.
pub type SharedStore = Arc<RwLock<ProjectStore>>;

/// Change notifications published by [`ProjectStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Replaced { count: usize },
    Inserted(ProjectId),
    Updated(ProjectId),
    Removed(ProjectId),
    BulkUpdated(Vec<ProjectId>),
    SelectionChanged(Option<ProjectId>),
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    ViewChanged,
}

#[derive(Debug)]
pub struct ProjectStore {
    records: Vec<ProjectRecord>,
    selected: Option<ProjectId>,
    loading: bool,
    error: Option<String>,
    criteria: FilterCriteria,
    search_text: String,
    sort: SortSpec,
    actor: String,
    events: broadcast::Sender<StoreEvent>,
}

impl ProjectStore {
    /// An empty store. `actor` is stamped on records modified locally.
    pub fn new(actor: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            records: Vec::new(),
            selected: None,
            loading: false,
            error: None,
            criteria: FilterCriteria::default(),
            search_text: String::new(),
            sort: SortSpec::default(),
            actor: actor.into(),
            events,
        }
    }

    pub fn shared(actor: impl Into<String>) -> SharedStore {
        Arc::new(RwLock::new(Self::new(actor)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ========================================================================
    // Snapshot mutations
    // ========================================================================

    /// Replace the whole snapshot and clear any reported error.
    pub fn set_all(&mut self, records: Vec<ProjectRecord>) {
        let count = records.len();
        self.records = records;
        self.error = None;
        debug!(count, "store snapshot replaced");
        self.publish(StoreEvent::Replaced { count });
    }

    /// Append a record. Duplicate ids are accepted as-is.
    pub fn insert(&mut self, record: ProjectRecord) {
        let id = record.id;
        self.records.push(record);
        self.publish(StoreEvent::Inserted(id));
    }

    /// Swap in `record` for the entry with the same id. Returns false if absent.
    pub fn replace(&mut self, record: ProjectRecord) -> bool {
        let id = record.id;
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                *slot = record;
                self.publish(StoreEvent::Updated(id));
                true
            }
            None => false,
        }
    }

    /// Delete every entry with `id`, dropping the selection if it pointed there.
    pub fn remove(&mut self, id: ProjectId) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() != before;

        if self.selected == Some(id) {
            self.selected = None;
            self.publish(StoreEvent::SelectionChanged(None));
        }
        if removed {
            self.publish(StoreEvent::Removed(id));
        }
        removed
    }

    /// Apply `patch` to every record in `ids`, stamping a fresh modified time.
    ///
    /// Returns the number of records touched.
    pub fn bulk_apply(&mut self, ids: &[ProjectId], patch: &ProjectPatch) -> usize {
        self.bulk_apply_at(ids, patch, OffsetDateTime::now_utc())
    }

    pub fn bulk_apply_at(
        &mut self,
        ids: &[ProjectId],
        patch: &ProjectPatch,
        at: OffsetDateTime,
    ) -> usize {
        let mut touched = Vec::new();
        for record in self.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            patch.apply_to(record);
            record.touch(&self.actor, at);
            touched.push(record.id);
        }

        let count = touched.len();
        if count > 0 {
            self.publish(StoreEvent::BulkUpdated(touched));
        }
        count
    }

    /// Swap in each record for the entry with the same id; unknown ids are skipped.
    ///
    /// Returns the number of records touched.
    pub fn replace_many(&mut self, records: Vec<ProjectRecord>) -> usize {
        let mut touched = Vec::new();
        for record in records {
            if let Some(slot) = self.records.iter_mut().find(|r| r.id == record.id) {
                touched.push(record.id);
                *slot = record;
            }
        }

        let count = touched.len();
        if count > 0 {
            self.publish(StoreEvent::BulkUpdated(touched));
        }
        count
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn select(&mut self, id: Option<ProjectId>) {
        if self.selected != id {
            self.selected = id;
            self.publish(StoreEvent::SelectionChanged(id));
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.publish(StoreEvent::LoadingChanged(loading));
        }
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error.clone();
        self.publish(StoreEvent::ErrorChanged(error));
    }

    pub fn set_filters(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.publish(StoreEvent::ViewChanged);
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.publish(StoreEvent::ViewChanged);
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.publish(StoreEvent::ViewChanged);
    }

    /// Reset filters and search text, keeping the sort order.
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.search_text.clear();
        self.publish(StoreEvent::ViewChanged);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn get(&self, id: ProjectId) -> Option<&ProjectRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: ProjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn selected(&self) -> Option<ProjectId> {
        self.selected
    }

    pub fn selected_record(&self) -> Option<&ProjectRecord> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    /// The snapshot narrowed by the active filters and ordered by the active sort.
    pub fn visible(&self) -> Vec<ProjectRecord> {
        let filtered = filtering::filter(&self.records, &self.criteria, &self.search_text);
        filtering::sort(&filtered, self.sort.field, self.sort.direction)
    }

    /// Rollup over the full snapshot, ignoring view filters.
    pub fn summary(&self) -> SummaryStats {
        summarize(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuditInfo, SortDirection, SortField, StatusCode};
    use time::macros::datetime;

    fn two_projects() -> Vec<ProjectRecord> {
        let audit = AuditInfo::new("importer", datetime!(2024-01-01 0:00 UTC));
        vec![
            ProjectRecord {
                audit: audit.clone(),
                ..ProjectRecord::new(1, "Test Project 1", StatusCode::InProgress).with_progress(50)
            },
            ProjectRecord {
                audit,
                ..ProjectRecord::new(2, "Test Project 2", StatusCode::Completed).with_progress(100)
            },
        ]
    }

    fn loaded_store() -> ProjectStore {
        let mut store = ProjectStore::new("tester");
        store.set_all(two_projects());
        store
    }

    #[test]
    fn set_all_replaces_snapshot_and_clears_error() {
        let mut store = ProjectStore::new("tester");
        store.set_error(Some("boom".to_string()));
        store.insert(ProjectRecord::new(9, "stale", StatusCode::NotStarted));

        store.set_all(two_projects());

        assert_eq!(store.len(), 2);
        assert!(store.error().is_none());
        assert!(!store.contains(ProjectId::new(9)));
    }

    #[test]
    fn insert_accepts_duplicate_ids() {
        let mut store = loaded_store();
        store.insert(ProjectRecord::new(1, "Duplicate", StatusCode::NotStarted));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn replace_swaps_matching_entry_only() {
        let mut store = loaded_store();

        let mut updated = store.get(ProjectId::new(2)).cloned().unwrap();
        updated.name = "Renamed".to_string();
        assert!(store.replace(updated));
        assert_eq!(store.get(ProjectId::new(2)).unwrap().name, "Renamed");

        assert!(!store.replace(ProjectRecord::new(42, "Ghost", StatusCode::NotStarted)));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_clears_matching_selection() {
        let mut store = loaded_store();
        store.select(Some(ProjectId::new(1)));

        assert!(store.remove(ProjectId::new(1)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, ProjectId::new(2));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn remove_keeps_unrelated_selection() {
        let mut store = loaded_store();
        store.select(Some(ProjectId::new(2)));

        store.remove(ProjectId::new(1));

        assert_eq!(store.selected(), Some(ProjectId::new(2)));
        assert_eq!(store.selected_record().unwrap().name, "Test Project 2");
    }

    #[test]
    fn bulk_apply_patches_and_stamps_each_record() {
        let mut store = loaded_store();
        let before = store.records().to_vec();
        let at = datetime!(2024-06-01 12:00 UTC);

        let touched = store.bulk_apply_at(
            &[ProjectId::new(1), ProjectId::new(2)],
            &ProjectPatch::status(StatusCode::OnHold),
            at,
        );

        assert_eq!(touched, 2);
        for (after, before) in store.records().iter().zip(&before) {
            assert_eq!(after.status, StatusCode::OnHold);
            assert_eq!(after.audit.modified_at, at);
            assert_eq!(after.audit.modified_by, "tester");
            assert_eq!(after.audit.created_at, before.audit.created_at);
            assert_eq!(after.name, before.name);
            assert_eq!(after.progress, before.progress);
        }
    }

    #[test]
    fn bulk_apply_ignores_unknown_ids() {
        let mut store = loaded_store();
        let touched = store.bulk_apply(&[ProjectId::new(99)], &ProjectPatch::status(StatusCode::OnHold));
        assert_eq!(touched, 0);
        assert_eq!(store.records()[0].status, StatusCode::InProgress);
    }

    #[test]
    fn replace_many_takes_records_as_given() {
        let mut store = loaded_store();
        let mut events = store.subscribe();
        let mut changed = store.records()[1].clone();
        changed.status = StatusCode::OnHold;
        changed.audit.modified_by = "backend".to_string();

        let touched = store.replace_many(vec![
            changed.clone(),
            ProjectRecord::new(99, "Unknown", StatusCode::OnHold),
        ]);

        assert_eq!(touched, 1);
        assert_eq!(store.get(changed.id), Some(&changed));
        assert!(!store.contains(ProjectId::new(99)));
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::BulkUpdated(vec![changed.id])
        );
    }

    #[test]
    fn visible_applies_filters_and_sort() {
        let mut store = loaded_store();
        store.set_sort(SortSpec::new(SortField::Progress, SortDirection::Desc));
        assert_eq!(store.visible()[0].id, ProjectId::new(2));

        store.set_search_text("project 1");
        let visible = store.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, ProjectId::new(1));

        store.clear_filters();
        assert_eq!(store.visible().len(), 2);
    }

    #[test]
    fn summary_tracks_snapshot() {
        let mut store = loaded_store();
        assert_eq!(store.summary().average_progress, 75.0);

        store.remove(ProjectId::new(2));
        let summary = store.summary();
        assert_eq!(summary.total_projects, 1);
        assert_eq!(summary.completed_projects, 0);
    }

    #[test]
    fn mutations_are_published() {
        let mut store = ProjectStore::new("tester");
        let mut events = store.subscribe();

        store.set_all(two_projects());
        store.select(Some(ProjectId::new(1)));
        store.remove(ProjectId::new(1));

        assert_eq!(events.try_recv().unwrap(), StoreEvent::Replaced { count: 2 });
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::SelectionChanged(Some(ProjectId::new(1)))
        );
        assert_eq!(events.try_recv().unwrap(), StoreEvent::SelectionChanged(None));
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::Removed(ProjectId::new(1))
        );
        assert!(events.try_recv().is_err());
    }
}
