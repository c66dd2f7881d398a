use time::macros::date;

use crate::domain::models::{Priority, ProjectRecord, StatusCode};

/// Demo projects for local runs.
pub fn seed_projects() -> Vec<ProjectRecord> {
    vec![
        ProjectRecord::new(1, "Intranet Redesign", StatusCode::InProgress)
            .with_owner("Alex Morgan")
            .with_priority(Priority::High)
            .with_progress(65)
            .with_budget(48_000.0)
            .with_dates(Some(date!(2024 - 01 - 15)), Some(date!(2024 - 06 - 30)))
            .with_tags(["Intranet", "UX"]),
        ProjectRecord::new(2, "HR Onboarding Portal", StatusCode::Completed)
            .with_owner("Sam Lee")
            .with_priority(Priority::Medium)
            .with_progress(100)
            .with_budget(22_500.0)
            .with_dates(Some(date!(2023 - 09 - 01)), Some(date!(2024 - 02 - 28)))
            .with_tags(["HR"]),
        ProjectRecord::new(3, "Document Migration", StatusCode::OnHold)
            .with_owner("Priya Nair")
            .with_priority(Priority::Low)
            .with_progress(30)
            .with_dates(Some(date!(2024 - 03 - 01)), None)
            .with_tags(["Migration", "Records"]),
        ProjectRecord::new(4, "Finance Dashboard", StatusCode::UnderReview)
            .with_owner("Jordan Blake")
            .with_priority(Priority::Critical)
            .with_progress(90)
            .with_budget(61_200.0)
            .with_tags(["Finance", "Reporting"]),
        ProjectRecord::new(5, "Teams Governance", StatusCode::NotStarted)
            .with_owner("Alex Morgan")
            .with_priority(Priority::Medium),
        ProjectRecord::new(6, "Legacy Forms Retirement", StatusCode::Cancelled)
            .with_owner("Sam Lee")
            .with_progress(10)
            .with_budget(5_000.0)
            .with_tags(["Migration"]),
    ]
}
