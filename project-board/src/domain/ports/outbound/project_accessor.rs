use async_trait::async_trait;

use crate::domain::{
    models::{FilterCriteria, NewProject, ProjectId, ProjectPatch, ProjectRecord},
    ProjectError,
};

/// Outbound port for the remote projects list.
///
/// This trait defines the contract any list backend (a hosted list,
/// a REST service, or the in-memory adapter) must implement. Every call
/// may fail with a transport or permission error.
#[async_trait]
pub trait ProjectDataAccessor: Send + Sync + 'static {
    /// Fetch the records matching `criteria`.
    async fn list(&self, criteria: &FilterCriteria) -> Result<Vec<ProjectRecord>, ProjectError>;

    /// Fetch a single record.
    async fn get(&self, id: ProjectId) -> Result<ProjectRecord, ProjectError>;

    /// Create a record. Returns it with the backend-assigned id and audit fields.
    async fn create(&self, project: &NewProject) -> Result<ProjectRecord, ProjectError>;

    /// Overwrite an existing record. Returns the stored version.
    async fn update(&self, project: &ProjectRecord) -> Result<ProjectRecord, ProjectError>;

    async fn delete(&self, id: ProjectId) -> Result<(), ProjectError>;

    /// Apply `patch` to every record in `ids`. Returns the updated records.
    async fn bulk_update(
        &self,
        ids: &[ProjectId],
        patch: &ProjectPatch,
    ) -> Result<Vec<ProjectRecord>, ProjectError>;
}
