use async_trait::async_trait;

use crate::domain::{
    models::{
        FilterCriteria, NewProject, ProjectId, ProjectPatch, ProjectRecord, StatusCode,
        SummaryStats,
    },
    CancellationFlag, ProjectServiceError,
};

/// Inbound port for the project board.
///
/// This trait defines the use cases a view can invoke. Reads go through the
/// query cache before reaching the backend; every successful mutation
/// refreshes the cache and the shared store.
#[async_trait]
pub trait ProjectService: Send + Sync + 'static {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Load the records matching `criteria` into the store.
    ///
    /// Nothing is committed to the store if `cancel` fires before the
    /// fetch completes.
    async fn load_projects(
        &self,
        criteria: &FilterCriteria,
        cancel: &CancellationFlag,
    ) -> Result<Vec<ProjectRecord>, ProjectServiceError>;

    /// Load a single record into the store.
    async fn get_project(
        &self,
        id: ProjectId,
        cancel: &CancellationFlag,
    ) -> Result<ProjectRecord, ProjectServiceError>;

    /// Rollup over the full, unfiltered backend list.
    async fn load_summary(&self) -> Result<SummaryStats, ProjectServiceError>;

    /// Drop all cached results and reload the unfiltered list.
    async fn refresh(&self) -> Result<Vec<ProjectRecord>, ProjectServiceError>;

    // ========================================================================
    // Mutations
    // ========================================================================

    async fn create_project(
        &self,
        project: &NewProject,
    ) -> Result<ProjectRecord, ProjectServiceError>;

    async fn update_project(
        &self,
        project: &ProjectRecord,
    ) -> Result<ProjectRecord, ProjectServiceError>;

    /// Move a project to `to`. Out-of-table moves are rejected only when
    /// transition enforcement is switched on.
    async fn change_status(
        &self,
        id: ProjectId,
        to: StatusCode,
    ) -> Result<ProjectRecord, ProjectServiceError>;

    async fn delete_project(&self, id: ProjectId) -> Result<(), ProjectServiceError>;

    async fn bulk_update(
        &self,
        ids: &[ProjectId],
        patch: &ProjectPatch,
    ) -> Result<Vec<ProjectRecord>, ProjectServiceError>;
}
