//! Pure filter and sort functions over project snapshots.
//!
//! Neither function fails: missing optional fields degrade to their zero
//! value (empty string, epoch, 0) instead.

use std::cmp::Ordering;

use time::Date;

use super::models::{FilterCriteria, ProjectRecord, SortDirection, SortField};

/// Records matching every present predicate of `criteria` and `search_text`.
///
/// Input order is preserved.
pub fn filter(
    records: &[ProjectRecord],
    criteria: &FilterCriteria,
    search_text: &str,
) -> Vec<ProjectRecord> {
    let search_text = search_text.trim().to_lowercase();

    records
        .iter()
        .filter(|record| matches(record, criteria))
        .filter(|record| search_text.is_empty() || record.name.to_lowercase().contains(&search_text))
        .cloned()
        .collect()
}

/// Whether a single record satisfies `criteria`.
pub fn matches(record: &ProjectRecord, criteria: &FilterCriteria) -> bool {
    if let Some(statuses) = criteria.status.as_ref().filter(|s| !s.is_empty()) {
        if !statuses.contains(&record.status) {
            return false;
        }
    }

    if let Some(priorities) = criteria.priority.as_ref().filter(|p| !p.is_empty()) {
        match record.priority {
            Some(p) if priorities.contains(&p) => {}
            _ => return false,
        }
    }

    if let Some(owner) = criteria.owner_term() {
        match &record.owner {
            Some(o) if contains_ignore_case(o, owner) => {}
            _ => return false,
        }
    }

    if let Some(search) = criteria.search_term() {
        if !contains_ignore_case(&record.name, search) {
            return false;
        }
    }

    // A record without a start date skips the range check entirely.
    if let Some(start) = record.start_date {
        if criteria.start_from.is_some_and(|from| start < from) {
            return false;
        }
        if criteria.start_to.is_some_and(|to| start > to) {
            return false;
        }
    }

    let wanted = criteria.tag_terms();
    if !wanted.is_empty() {
        let hit = wanted.iter().any(|tag| {
            record
                .tags
                .iter()
                .any(|record_tag| contains_ignore_case(record_tag, tag))
        });
        if !hit {
            return false;
        }
    }

    true
}

/// A new, stably ordered copy of `records`.
pub fn sort(
    records: &[ProjectRecord],
    field: SortField,
    direction: SortDirection,
) -> Vec<ProjectRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_by(field, a, b);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

fn compare_by(field: SortField, a: &ProjectRecord, b: &ProjectRecord) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Status => a.status.cmp(&b.status),
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::StartDate => start_or_epoch(a).cmp(&start_or_epoch(b)),
        SortField::Progress => progress_or_zero(a).cmp(&progress_or_zero(b)),
    }
}

fn start_or_epoch(record: &ProjectRecord) -> Date {
    record
        .start_date
        .unwrap_or(time::OffsetDateTime::UNIX_EPOCH.date())
}

fn progress_or_zero(record: &ProjectRecord) -> u8 {
    record.progress.map(|p| p.percent()).unwrap_or(0)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
