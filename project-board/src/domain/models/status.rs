//! Status registry: display metadata and the transition graph for project statuses.
//!
//! The transition table is advisory. It drives which next-state options a
//! view offers; the service only rejects out-of-table changes when
//! `workflow.enforce_transitions` is switched on.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a project.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum StatusCode {
    #[default]
    #[strum(to_string = "Not Started", serialize = "NotStarted")]
    NotStarted,
    #[strum(to_string = "In Progress", serialize = "InProgress")]
    InProgress,
    #[strum(to_string = "Completed")]
    Completed,
    #[strum(to_string = "On Hold", serialize = "OnHold")]
    OnHold,
    #[strum(to_string = "Cancelled")]
    Cancelled,
    #[strum(to_string = "Under Review", serialize = "UnderReview")]
    UnderReview,
    #[strum(to_string = "Approved")]
    Approved,
    #[strum(to_string = "Rejected")]
    Rejected,
}

impl StatusCode {
    /// Every status in declaration order.
    pub const ALL: [StatusCode; 8] = [
        StatusCode::NotStarted,
        StatusCode::InProgress,
        StatusCode::Completed,
        StatusCode::OnHold,
        StatusCode::Cancelled,
        StatusCode::UnderReview,
        StatusCode::Approved,
        StatusCode::Rejected,
    ];

    pub fn info(self) -> &'static StatusInfo {
        info_for(self)
    }

    pub fn next_states(self) -> &'static [StatusCode] {
        next_states_for(self)
    }

    pub fn can_transition_to(self, to: StatusCode) -> bool {
        can_transition(self, to)
    }
}

/// Display metadata for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub background: &'static str,
    pub description: &'static str,
}

const NOT_STARTED: StatusInfo = StatusInfo {
    label: "Not Started",
    color: "#605e5c",
    background: "#f3f2f1",
    description: "Work has not begun yet",
};

const IN_PROGRESS: StatusInfo = StatusInfo {
    label: "In Progress",
    color: "#0078d4",
    background: "#deecf9",
    description: "Work is actively underway",
};

const COMPLETED: StatusInfo = StatusInfo {
    label: "Completed",
    color: "#107c10",
    background: "#dff6dd",
    description: "All deliverables are done",
};

const ON_HOLD: StatusInfo = StatusInfo {
    label: "On Hold",
    color: "#ca5010",
    background: "#fed9cc",
    description: "Work is paused until further notice",
};

const CANCELLED: StatusInfo = StatusInfo {
    label: "Cancelled",
    color: "#a4262c",
    background: "#fde7e9",
    description: "The project will not be delivered",
};

const UNDER_REVIEW: StatusInfo = StatusInfo {
    label: "Under Review",
    color: "#8764b8",
    background: "#efe6f9",
    description: "Deliverables are awaiting review",
};

const APPROVED: StatusInfo = StatusInfo {
    label: "Approved",
    color: "#0b6a0b",
    background: "#e7f2da",
    description: "Review passed and the project was signed off",
};

const REJECTED: StatusInfo = StatusInfo {
    label: "Rejected",
    color: "#d13438",
    background: "#fde7e9",
    description: "Review failed and changes are required",
};

/// Display metadata for a status.
pub fn info_for(status: StatusCode) -> &'static StatusInfo {
    match status {
        StatusCode::NotStarted => &NOT_STARTED,
        StatusCode::InProgress => &IN_PROGRESS,
        StatusCode::Completed => &COMPLETED,
        StatusCode::OnHold => &ON_HOLD,
        StatusCode::Cancelled => &CANCELLED,
        StatusCode::UnderReview => &UNDER_REVIEW,
        StatusCode::Approved => &APPROVED,
        StatusCode::Rejected => &REJECTED,
    }
}

/// Display metadata for a raw status code.
///
/// Unknown codes fall back to the "Not Started" metadata.
pub fn info_for_code(code: &str) -> &'static StatusInfo {
    StatusCode::from_str(code.trim())
        .map(info_for)
        .unwrap_or(&NOT_STARTED)
}

/// Statuses reachable from `status` in one step.
pub fn next_states_for(status: StatusCode) -> &'static [StatusCode] {
    use StatusCode::*;

    match status {
        NotStarted => &[InProgress, OnHold, Cancelled],
        InProgress => &[Completed, OnHold, UnderReview],
        OnHold => &[InProgress, Cancelled],
        UnderReview => &[Approved, Rejected, InProgress],
        Approved => &[InProgress],
        Rejected => &[InProgress, Cancelled],
        Completed => &[UnderReview],
        Cancelled => &[NotStarted],
    }
}

/// Statuses reachable from a raw status code. Unknown codes have none.
pub fn next_states_for_code(code: &str) -> &'static [StatusCode] {
    StatusCode::from_str(code.trim())
        .map(next_states_for)
        .unwrap_or(&[])
}

pub fn can_transition(from: StatusCode, to: StatusCode) -> bool {
    next_states_for(from).contains(&to)
}
