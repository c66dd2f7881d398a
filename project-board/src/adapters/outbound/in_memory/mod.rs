//! In-memory project list backend.
//!
//! Stands in for the hosted list in tests and in the demo binary. Supports
//! failure injection and call counting so service behaviour around remote
//! errors can be exercised without a network.

mod seed;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{
    filtering,
    models::{AuditInfo, FilterCriteria, NewProject, ProjectId, ProjectPatch, ProjectRecord},
    ports::outbound::ProjectDataAccessor,
    ProjectError,
};

pub use seed::seed_projects;

/// Project backend backed by an in-memory list.
///
/// # Examples
///
/// ```
/// use project_board::adapters::outbound::in_memory::{seed_projects, InMemoryProjectAccessor};
///
/// let accessor = InMemoryProjectAccessor::new("demo").with_projects(seed_projects());
/// assert!(!accessor.is_empty());
/// ```
#[derive(Clone)]
pub struct InMemoryProjectAccessor {
    projects: Arc<RwLock<Vec<ProjectRecord>>>,
    next_id: Arc<AtomicI32>,
    actor: String,
    failures: Arc<Mutex<VecDeque<ProjectError>>>,
    call_count: Arc<AtomicUsize>,
}

impl InMemoryProjectAccessor {
    /// An empty backend. `actor` is stamped on records it creates or modifies.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            projects: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicI32::new(1)),
            actor: actor.into(),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add initial records. New ids continue after the highest one given.
    pub fn with_projects(self, records: Vec<ProjectRecord>) -> Self {
        {
            let mut projects = self.projects.write().expect("project list lock poisoned");
            projects.extend(records);
            let max_id = projects.iter().map(|p| p.id.as_i32()).max().unwrap_or(0);
            self.next_id.store(max_id + 1, Ordering::SeqCst);
        }
        self
    }

    /// Make the next call fail with `error`. Queued failures are consumed in order.
    pub fn fail_next(&self, error: ProjectError) {
        self.failures
            .lock()
            .expect("failure queue lock poisoned")
            .push_back(error);
    }

    /// Number of backend calls made so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.projects.read().expect("project list lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current backend copy of a record (for test assertions).
    pub fn project(&self, id: ProjectId) -> Option<ProjectRecord> {
        self.projects
            .read()
            .expect("project list lock poisoned")
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    fn begin_call(&self) -> Result<(), ProjectError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self
            .failures
            .lock()
            .expect("failure queue lock poisoned")
            .pop_front()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProjectDataAccessor for InMemoryProjectAccessor {
    async fn list(&self, criteria: &FilterCriteria) -> Result<Vec<ProjectRecord>, ProjectError> {
        self.begin_call()?;
        let projects = self.projects.read().expect("project list lock poisoned");
        Ok(filtering::filter(&projects, criteria, ""))
    }

    async fn get(&self, id: ProjectId) -> Result<ProjectRecord, ProjectError> {
        self.begin_call()?;
        self.project(id).ok_or(ProjectError::NotFound(id))
    }

    async fn create(&self, project: &NewProject) -> Result<ProjectRecord, ProjectError> {
        self.begin_call()?;
        project.validate()?;

        let id = ProjectId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let audit = AuditInfo::new(self.actor.clone(), OffsetDateTime::now_utc());
        let record = ProjectRecord::from_new(id, project.clone(), audit);

        self.projects
            .write()
            .expect("project list lock poisoned")
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, project: &ProjectRecord) -> Result<ProjectRecord, ProjectError> {
        self.begin_call()?;
        project.validate()?;

        let mut projects = self.projects.write().expect("project list lock poisoned");
        let slot = projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or(ProjectError::NotFound(project.id))?;

        // Creation audit is owned by the backend.
        let created_at = slot.audit.created_at;
        let created_by = slot.audit.created_by.clone();
        *slot = project.clone();
        slot.audit.created_at = created_at;
        slot.audit.created_by = created_by;
        slot.touch(&self.actor, OffsetDateTime::now_utc());

        Ok(slot.clone())
    }

    async fn delete(&self, id: ProjectId) -> Result<(), ProjectError> {
        self.begin_call()?;

        let mut projects = self.projects.write().expect("project list lock poisoned");
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Err(ProjectError::NotFound(id));
        }
        Ok(())
    }

    async fn bulk_update(
        &self,
        ids: &[ProjectId],
        patch: &ProjectPatch,
    ) -> Result<Vec<ProjectRecord>, ProjectError> {
        self.begin_call()?;
        patch.validate()?;

        let mut projects = self.projects.write().expect("project list lock poisoned");
        if let Some(missing) = ids.iter().find(|id| !projects.iter().any(|p| p.id == **id)) {
            return Err(ProjectError::NotFound(*missing));
        }

        let now = OffsetDateTime::now_utc();
        let mut updated = Vec::with_capacity(ids.len());
        for project in projects.iter_mut().filter(|p| ids.contains(&p.id)) {
            patch.apply_to(project);
            project.touch(&self.actor, now);
            updated.push(project.clone());
        }
        Ok(updated)
    }
}
