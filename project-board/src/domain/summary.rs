use super::models::{ProjectRecord, StatusCode, SummaryStats};

/// Rollup statistics over `records` in a single pass.
pub fn summarize(records: &[ProjectRecord]) -> SummaryStats {
    let mut stats = SummaryStats::default();
    let mut progress_sum = 0u64;

    for record in records {
        stats.total_projects += 1;
        match record.status {
            StatusCode::InProgress => stats.active_projects += 1,
            StatusCode::Completed => stats.completed_projects += 1,
            StatusCode::OnHold => stats.on_hold_projects += 1,
            StatusCode::NotStarted => stats.not_started_projects += 1,
            StatusCode::Cancelled
            | StatusCode::UnderReview
            | StatusCode::Approved
            | StatusCode::Rejected => {}
        }
        progress_sum += u64::from(record.progress.map(|p| p.percent()).unwrap_or(0));
        stats.total_budget += record.budget.unwrap_or(0.0);
    }

    if stats.total_projects > 0 {
        stats.average_progress = progress_sum as f64 / stats.total_projects as f64;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_is_all_zeroes() {
        assert_eq!(summarize(&[]), SummaryStats::default());
        assert_eq!(summarize(&[]).average_progress, 0.0);
    }

    #[test]
    fn counts_buckets_and_averages_progress() {
        let records = vec![
            ProjectRecord::new(1, "Test Project 1", StatusCode::InProgress).with_progress(50),
            ProjectRecord::new(2, "Test Project 2", StatusCode::Completed).with_progress(100),
        ];

        let stats = summarize(&records);
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.average_progress, 75.0);
    }

    #[test]
    fn untracked_statuses_only_count_toward_total() {
        let records = vec![
            ProjectRecord::new(1, "a", StatusCode::Cancelled),
            ProjectRecord::new(2, "b", StatusCode::UnderReview),
            ProjectRecord::new(3, "c", StatusCode::Approved),
            ProjectRecord::new(4, "d", StatusCode::Rejected),
            ProjectRecord::new(5, "e", StatusCode::OnHold),
            ProjectRecord::new(6, "f", StatusCode::NotStarted),
        ];

        let stats = summarize(&records);
        assert_eq!(stats.total_projects, 6);
        assert_eq!(stats.on_hold_projects, 1);
        assert_eq!(stats.not_started_projects, 1);
        assert_eq!(stats.active_projects + stats.completed_projects, 0);
    }

    #[test]
    fn missing_budget_and_progress_count_as_zero() {
        let records = vec![
            ProjectRecord::new(1, "a", StatusCode::InProgress)
                .with_budget(1200.5)
                .with_progress(80),
            ProjectRecord::new(2, "b", StatusCode::InProgress),
        ];

        let stats = summarize(&records);
        assert_eq!(stats.total_budget, 1200.5);
        assert_eq!(stats.average_progress, 40.0);
    }
}
