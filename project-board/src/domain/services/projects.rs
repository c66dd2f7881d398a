use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::domain::{
    models::{
        FilterCriteria, NewProject, ProjectId, ProjectPatch, ProjectRecord, StatusCode,
        SummaryStats,
    },
    ports::{inbound::ProjectService, outbound::ProjectDataAccessor},
    summary::summarize,
    CancellationFlag, Operation, ProjectError, ProjectServiceError, ProjectStore, SharedStore,
};
use crate::services::query_cache::{QueryCache, QueryCacheConfig, QueryFamily, QueryKey};

/// Values held by the project query cache, one variant per key family.
#[derive(Debug, Clone)]
pub enum CachedQuery {
    Projects(Vec<ProjectRecord>),
    Project(ProjectRecord),
    Summary(SummaryStats),
}

/// Implementation of the ProjectService inbound port.
///
/// Reads are served from the query cache while fresh and fetched through the
/// ProjectDataAccessor (outbound port) otherwise. Successful mutations
/// invalidate the list and summary families, write the touched records
/// through to the cache, and are then applied to the shared store.
///
/// A failed remote call never clears cached data or the store snapshot, and
/// the store is not rolled back after a failed mutation.
pub struct ProjectServiceImpl<A: ProjectDataAccessor> {
    accessor: Arc<A>,
    cache: QueryCache<CachedQuery>,
    store: SharedStore,
    enforce_transitions: bool,
}

impl<A: ProjectDataAccessor> ProjectServiceImpl<A> {
    pub fn new(accessor: Arc<A>, store: SharedStore, cache_config: QueryCacheConfig) -> Self {
        Self {
            accessor,
            cache: QueryCache::new(cache_config),
            store,
            enforce_transitions: false,
        }
    }

    /// Reject status changes that are not in the transition table.
    pub fn with_transition_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_transitions = enforce;
        self
    }

    pub fn cache(&self) -> &QueryCache<CachedQuery> {
        &self.cache
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Last fetched result for `criteria`, even if it is stale.
    pub fn cached_projects(&self, criteria: &FilterCriteria) -> Option<Vec<ProjectRecord>> {
        match self.cache.peek(&QueryKey::list(criteria))?.value {
            CachedQuery::Projects(records) => Some(records),
            _ => None,
        }
    }

    fn invalidate_aggregates(&self) {
        self.cache.invalidate_family(QueryFamily::List);
        self.cache.invalidate_family(QueryFamily::Summary);
    }

    /// Log and record a failed call, then tag it with its operation.
    async fn fail(
        &self,
        operation: Operation,
        id: Option<ProjectId>,
        source: ProjectError,
    ) -> ProjectServiceError {
        let err = ProjectServiceError::new(operation, id, source);
        warn!(%operation, id = ?id, error = %err.source, "project operation failed");
        self.store.write().await.set_error(Some(err.to_string()));
        err
    }

    async fn persist_update(
        &self,
        operation: Operation,
        record: &ProjectRecord,
    ) -> Result<ProjectRecord, ProjectServiceError> {
        if let Err(e) = record.validate() {
            return Err(ProjectServiceError::new(operation, Some(record.id), e));
        }

        let stored = match self.accessor.update(record).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.fail(operation, Some(record.id), e).await),
        };

        self.invalidate_aggregates();
        self.cache
            .write(&QueryKey::project(stored.id), CachedQuery::Project(stored.clone()));
        self.store.write().await.replace(stored.clone());

        info!(id = %stored.id, status = %stored.status, "project updated");
        Ok(stored)
    }
}

/// Replace the record if the store has it, append it otherwise.
fn upsert(store: &mut ProjectStore, record: ProjectRecord) {
    if !store.replace(record.clone()) {
        store.insert(record);
    }
}

#[async_trait]
impl<A: ProjectDataAccessor> ProjectService for ProjectServiceImpl<A> {
    async fn load_projects(
        &self,
        criteria: &FilterCriteria,
        cancel: &CancellationFlag,
    ) -> Result<Vec<ProjectRecord>, ProjectServiceError> {
        let key = QueryKey::list(criteria);

        if let Some(CachedQuery::Projects(records)) = self.cache.read(&key) {
            debug!(key = %key, count = records.len(), "projects served from cache");
            if !cancel.is_cancelled() {
                self.store.write().await.set_all(records.clone());
            }
            return Ok(records);
        }

        self.store.write().await.set_loading(true);
        let result = self.accessor.list(criteria).await;
        self.store.write().await.set_loading(false);

        let records = match result {
            Ok(records) => records,
            Err(e) if cancel.is_cancelled() => {
                debug!(key = %key, error = %e, "cancelled fetch failed, error not reported");
                return Err(ProjectServiceError::new(Operation::List, None, e));
            }
            Err(e) => return Err(self.fail(Operation::List, None, e).await),
        };

        // The data is valid even if the view went away.
        self.cache
            .write(&key, CachedQuery::Projects(records.clone()));

        if cancel.is_cancelled() {
            debug!(key = %key, "fetch cancelled, store left untouched");
        } else {
            self.store.write().await.set_all(records.clone());
        }

        info!(key = %key, count = records.len(), "projects loaded");
        Ok(records)
    }

    async fn get_project(
        &self,
        id: ProjectId,
        cancel: &CancellationFlag,
    ) -> Result<ProjectRecord, ProjectServiceError> {
        let key = QueryKey::project(id);

        let record = match self.cache.read(&key) {
            Some(CachedQuery::Project(record)) => {
                debug!(%id, "project served from cache");
                record
            }
            _ => {
                let record = match self.accessor.get(id).await {
                    Ok(record) => record,
                    Err(e) if cancel.is_cancelled() => {
                        debug!(%id, error = %e, "cancelled fetch failed, error not reported");
                        return Err(ProjectServiceError::new(Operation::Get, Some(id), e));
                    }
                    Err(e) => return Err(self.fail(Operation::Get, Some(id), e).await),
                };
                self.cache.write(&key, CachedQuery::Project(record.clone()));
                record
            }
        };

        if !cancel.is_cancelled() {
            upsert(&mut *self.store.write().await, record.clone());
        }
        Ok(record)
    }

    async fn load_summary(&self) -> Result<SummaryStats, ProjectServiceError> {
        let key = QueryKey::summary();

        if let Some(CachedQuery::Summary(stats)) = self.cache.read(&key) {
            debug!("summary served from cache");
            return Ok(stats);
        }

        let all = FilterCriteria::default();
        let records = match self.accessor.list(&all).await {
            Ok(records) => records,
            Err(e) => return Err(self.fail(Operation::Summary, None, e).await),
        };

        let stats = summarize(&records);
        self.cache.write(&key, CachedQuery::Summary(stats));
        self.cache
            .write(&QueryKey::list(&all), CachedQuery::Projects(records));

        info!(
            total = stats.total_projects,
            active = stats.active_projects,
            completed = stats.completed_projects,
            "summary computed"
        );
        Ok(stats)
    }

    async fn refresh(&self) -> Result<Vec<ProjectRecord>, ProjectServiceError> {
        let marked = self.cache.invalidate("");
        debug!(marked, "all cached queries marked stale");
        self.load_projects(&FilterCriteria::default(), &CancellationFlag::new())
            .await
    }

    async fn create_project(
        &self,
        project: &NewProject,
    ) -> Result<ProjectRecord, ProjectServiceError> {
        if let Err(e) = project.validate() {
            return Err(ProjectServiceError::new(Operation::Create, None, e));
        }

        let created = match self.accessor.create(project).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail(Operation::Create, None, e).await),
        };

        self.invalidate_aggregates();
        self.cache
            .write(&QueryKey::project(created.id), CachedQuery::Project(created.clone()));
        self.store.write().await.insert(created.clone());

        info!(id = %created.id, name = %created.name, "project created");
        Ok(created)
    }

    async fn update_project(
        &self,
        project: &ProjectRecord,
    ) -> Result<ProjectRecord, ProjectServiceError> {
        self.persist_update(Operation::Update, project).await
    }

    async fn change_status(
        &self,
        id: ProjectId,
        to: StatusCode,
    ) -> Result<ProjectRecord, ProjectServiceError> {
        let current = self.store.read().await.get(id).cloned();
        let mut record = match current {
            Some(record) => record,
            None => match self.accessor.get(id).await {
                Ok(record) => record,
                Err(e) => return Err(self.fail(Operation::ChangeStatus, Some(id), e).await),
            },
        };

        let from = record.status;
        if from == to {
            return Ok(record);
        }
        if self.enforce_transitions && !from.can_transition_to(to) {
            return Err(ProjectServiceError::new(
                Operation::ChangeStatus,
                Some(id),
                ProjectError::validation(format!("cannot move from {from} to {to}")),
            ));
        }
        if !from.can_transition_to(to) {
            debug!(%id, %from, %to, "status change outside transition table");
        }

        record.status = to;
        self.persist_update(Operation::ChangeStatus, &record).await
    }

    async fn delete_project(&self, id: ProjectId) -> Result<(), ProjectServiceError> {
        if let Err(e) = self.accessor.delete(id).await {
            return Err(self.fail(Operation::Delete, Some(id), e).await);
        }

        self.invalidate_aggregates();
        self.cache.remove(&QueryKey::project(id));
        self.store.write().await.remove(id);

        info!(%id, "project deleted");
        Ok(())
    }

    async fn bulk_update(
        &self,
        ids: &[ProjectId],
        patch: &ProjectPatch,
    ) -> Result<Vec<ProjectRecord>, ProjectServiceError> {
        let ids: Vec<ProjectId> = ids.iter().copied().unique().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if patch.is_empty() {
            return Err(ProjectServiceError::new(
                Operation::BulkUpdate,
                None,
                ProjectError::validation("patch has no fields"),
            ));
        }
        if let Err(e) = patch.validate() {
            return Err(ProjectServiceError::new(Operation::BulkUpdate, None, e));
        }

        let updated = match self.accessor.bulk_update(&ids, patch).await {
            Ok(updated) => updated,
            Err(e) => return Err(self.fail(Operation::BulkUpdate, None, e).await),
        };

        self.invalidate_aggregates();
        for record in &updated {
            self.cache
                .write(&QueryKey::project(record.id), CachedQuery::Project(record.clone()));
        }
        let touched = self.store.write().await.replace_many(updated.clone());

        info!(requested = ids.len(), touched, "projects bulk updated");
        Ok(updated)
    }
}
