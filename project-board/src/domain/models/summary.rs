use serde::{Deserialize, Serialize};

/// Rollup figures for a project collection.
///
/// Only four statuses get their own bucket. Cancelled, under review,
/// approved and rejected projects count toward `total_projects` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub on_hold_projects: usize,
    pub not_started_projects: usize,
    pub average_progress: f64,
    pub total_budget: f64,
}
