use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Date, OffsetDateTime};

use super::{ProjectId, StatusCode};
use crate::domain::ProjectError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Project priority, ordered from least to most urgent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Completion percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const MAX: u8 = 100;

    pub fn new(percent: u8) -> Result<Self, ProjectError> {
        if percent > Self::MAX {
            return Err(ProjectError::validation(format!(
                "progress must be between 0 and 100, got {percent}"
            )));
        }
        Ok(Self(percent))
    }

    /// Clamps values above 100 instead of rejecting them.
    pub fn saturating(percent: u8) -> Self {
        Self(percent.min(Self::MAX))
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Progress {
    type Error = ProjectError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl From<Progress> for u8 {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

/// Who touched a record, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub modified_by: String,
}

impl AuditInfo {
    pub fn new(actor: impl Into<String>, at: OffsetDateTime) -> Self {
        let actor = actor.into();
        Self {
            created_at: at,
            created_by: actor.clone(),
            modified_at: at,
            modified_by: actor,
        }
    }
}

/// An item of the projects list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub status: StatusCode,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub audit: AuditInfo,
}

impl ProjectRecord {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>, status: StatusCode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            description: None,
            start_date: None,
            end_date: None,
            owner: None,
            priority: None,
            progress: None,
            budget: None,
            tags: Vec::new(),
            audit: AuditInfo::new("system", OffsetDateTime::now_utc()),
        }
    }

    /// Materialize a create request under a backend-assigned id.
    pub fn from_new(id: ProjectId, new: NewProject, audit: AuditInfo) -> Self {
        Self {
            id,
            name: new.name,
            status: new.status,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            owner: new.owner,
            priority: new.priority,
            progress: new.progress,
            budget: new.budget,
            tags: new.tags,
            audit,
        }
    }

    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress = Some(Progress::saturating(percent));
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_dates(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Stamp a modification by `actor` at `at`.
    pub fn touch(&mut self, actor: &str, at: OffsetDateTime) {
        self.audit.modified_at = at;
        self.audit.modified_by = actor.to_string();
    }

    /// Check the fields a backend would reject.
    pub fn validate(&self) -> Result<(), ProjectError> {
        validate_fields(&self.name, self.budget, self.start_date, self.end_date)
    }
}

/// Payload for creating a project. The backend assigns id and audit fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub status: StatusCode,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_dates(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        validate_fields(&self.name, self.budget, self.start_date, self.end_date)
    }
}

/// Partial update applied to many records at once.
///
/// Present fields overwrite, absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub start_date: Option<Date>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub end_date: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ProjectPatch {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields present in the patch. Audit fields are left to the caller.
    pub fn apply_to(&self, record: &mut ProjectRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(start) = self.start_date {
            record.start_date = Some(start);
        }
        if let Some(end) = self.end_date {
            record.end_date = Some(end);
        }
        if let Some(owner) = &self.owner {
            record.owner = Some(owner.clone());
        }
        if let Some(priority) = self.priority {
            record.priority = Some(priority);
        }
        if let Some(progress) = self.progress {
            record.progress = Some(progress);
        }
        if let Some(budget) = self.budget {
            record.budget = Some(budget);
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ProjectError::validation("name cannot be empty"));
            }
        }
        if let Some(budget) = self.budget {
            if budget < 0.0 || !budget.is_finite() {
                return Err(ProjectError::validation("budget cannot be negative"));
            }
        }
        Ok(())
    }
}

fn validate_fields(
    name: &str,
    budget: Option<f64>,
    start: Option<Date>,
    end: Option<Date>,
) -> Result<(), ProjectError> {
    if name.trim().is_empty() {
        return Err(ProjectError::validation("name is required"));
    }
    if let Some(budget) = budget {
        if budget < 0.0 || !budget.is_finite() {
            return Err(ProjectError::validation("budget cannot be negative"));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ProjectError::validation(
                "end date cannot be before start date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn progress_rejects_values_above_hundred() {
        assert!(Progress::new(100).is_ok());
        assert!(matches!(
            Progress::new(101),
            Err(ProjectError::Validation(_))
        ));
        assert_eq!(Progress::saturating(250).percent(), 100);
    }

    #[test]
    fn progress_is_range_checked_on_deserialize() {
        assert!(serde_json::from_str::<Progress>("42").is_ok());
        assert!(serde_json::from_str::<Progress>("120").is_err());
    }

    #[test]
    fn new_project_requires_name() {
        assert!(NewProject::new("   ").validate().is_err());
        assert!(NewProject::new("Intranet refresh").validate().is_ok());
    }

    #[test]
    fn new_project_rejects_negative_budget_and_inverted_dates() {
        assert!(NewProject::new("A").with_budget(-1.0).validate().is_err());
        assert!(NewProject::new("A")
            .with_dates(Some(date!(2024 - 05 - 01)), Some(date!(2024 - 04 - 01)))
            .validate()
            .is_err());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut record = ProjectRecord::new(1, "Test Project 1", StatusCode::InProgress)
            .with_progress(50)
            .with_owner("Alex");
        let before = record.clone();

        ProjectPatch::status(StatusCode::OnHold).apply_to(&mut record);

        assert_eq!(record.status, StatusCode::OnHold);
        assert_eq!(record.name, before.name);
        assert_eq!(record.progress, before.progress);
        assert_eq!(record.owner, before.owner);
        assert_eq!(record.audit, before.audit);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProjectPatch::default().is_empty());
        assert!(!ProjectPatch::status(StatusCode::Completed).is_empty());
    }

    #[test]
    fn record_serializes_dates_as_iso() {
        let record = ProjectRecord::new(7, "Portal", StatusCode::NotStarted)
            .with_dates(Some(date!(2024 - 03 - 15)), None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["startDate"], "2024-03-15");
        assert!(json["endDate"].is_null());
        assert_eq!(json["status"], "NotStarted");

        let back: ProjectRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
