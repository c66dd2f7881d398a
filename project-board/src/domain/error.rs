use strum::Display;
use thiserror::Error;

use super::models::ProjectId;

/// Errors reported by the project list backend or by request validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl ProjectError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ProjectErrorKind {
        match self {
            Self::Transport(_) => ProjectErrorKind::Transport,
            Self::Permission(_) => ProjectErrorKind::Permission,
            Self::NotFound(_) => ProjectErrorKind::NotFound,
            Self::Validation(_) => ProjectErrorKind::Validation,
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProjectErrorKind {
    Transport,
    Permission,
    NotFound,
    Validation,
}

/// The service operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    List,
    Get,
    Summary,
    Create,
    Update,
    ChangeStatus,
    Delete,
    BulkUpdate,
}

/// A backend or validation error, tagged with what was being attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed{}: {source}", .id.map(|id| format!(" for project {id}")).unwrap_or_default())]
pub struct ProjectServiceError {
    pub operation: Operation,
    pub id: Option<ProjectId>,
    #[source]
    pub source: ProjectError,
}

impl ProjectServiceError {
    pub fn new(operation: Operation, id: Option<ProjectId>, source: ProjectError) -> Self {
        Self {
            operation,
            id,
            source,
        }
    }

    pub fn kind(&self) -> ProjectErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_message_names_operation_and_id() {
        let err = ProjectServiceError::new(
            Operation::Delete,
            Some(ProjectId::new(4)),
            ProjectError::NotFound(ProjectId::new(4)),
        );
        assert_eq!(
            err.to_string(),
            "delete failed for project 4: project not found: 4"
        );
        assert_eq!(err.kind(), ProjectErrorKind::NotFound);
    }

    #[test]
    fn service_error_message_without_id() {
        let err = ProjectServiceError::new(
            Operation::List,
            None,
            ProjectError::transport("connection reset"),
        );
        assert_eq!(
            err.to_string(),
            "list failed: transport error: connection reset"
        );
        assert!(err.source.is_transient());
    }
}
