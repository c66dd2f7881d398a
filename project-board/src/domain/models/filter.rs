use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::{Priority, StatusCode};

/// Active predicates for narrowing the project list.
///
/// Every field is optional. An absent (or empty) field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Any of these statuses.
    pub status: Option<Vec<StatusCode>>,
    /// Any of these priorities.
    pub priority: Option<Vec<Priority>>,
    /// Case-insensitive substring of the owner.
    pub owner: Option<String>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Inclusive lower bound on the start date.
    pub start_from: Option<Date>,
    /// Inclusive upper bound on the start date.
    pub start_to: Option<Date>,
    /// Any of these is a case-insensitive substring of any record tag.
    pub tags: Option<Vec<String>>,
}

impl FilterCriteria {
    pub fn with_status(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        self.status = Some(statuses.into_iter().collect());
        self
    }

    pub fn with_priority(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priority = Some(priorities.into_iter().collect());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_start_range(mut self, from: Option<Date>, to: Option<Date>) -> Self {
        self.start_from = from;
        self.start_to = to;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Owner predicate with surrounding whitespace removed; blank means none.
    pub fn owner_term(&self) -> Option<&str> {
        non_blank(&self.owner)
    }

    /// Name predicate with surrounding whitespace removed; blank means none.
    pub fn search_term(&self) -> Option<&str> {
        non_blank(&self.search)
    }

    /// Trimmed, non-blank tag predicates. Empty means no tag constraint.
    pub fn tag_terms(&self) -> Vec<&str> {
        self.tags
            .iter()
            .flatten()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// True when no field constrains the list.
    pub fn is_unconstrained(&self) -> bool {
        self.status.as_ref().map_or(true, Vec::is_empty)
            && self.priority.as_ref().map_or(true, Vec::is_empty)
            && self.owner_term().is_none()
            && self.search_term().is_none()
            && self.start_from.is_none()
            && self.start_to.is_none()
            && self.tag_terms().is_empty()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Column a project list can be ordered by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    Name,
    Status,
    Priority,
    StartDate,
    Progress,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_trimmed_and_blank_ones_dropped() {
        let criteria = FilterCriteria::default()
            .with_owner("  ")
            .with_search(" portal ")
            .with_tags([" hr", "", "Intranet "]);

        assert_eq!(criteria.owner_term(), None);
        assert_eq!(criteria.search_term(), Some("portal"));
        assert_eq!(criteria.tag_terms(), vec!["hr", "Intranet"]);
    }

    #[test]
    fn blank_fields_leave_criteria_unconstrained() {
        assert!(FilterCriteria::default().is_unconstrained());
        assert!(FilterCriteria::default()
            .with_owner(" ")
            .with_tags(["", "  "])
            .with_status([])
            .is_unconstrained());
        assert!(!FilterCriteria::default().with_tags([" hr"]).is_unconstrained());
    }
}
