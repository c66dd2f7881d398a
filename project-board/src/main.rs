use std::sync::Arc;

use anyhow::{Context, Result};
use project_board::{
    adapters::outbound::in_memory::{seed_projects, InMemoryProjectAccessor},
    config::read_config,
    domain::{
        models::{
            FilterCriteria, NewProject, Priority, Progress, ProjectPatch, SortDirection,
            SortField, SortSpec, StatusCode,
        },
        ports::inbound::ProjectService,
        services::ProjectServiceImpl,
        CancellationFlag, ProjectStore, StoreEvent,
    },
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("project_board=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = read_config().context("failed to read configuration")?;
    info!(
        actor = %settings.application.actor,
        enforce_transitions = settings.workflow.enforce_transitions,
        "configuration loaded"
    );

    let accessor =
        Arc::new(InMemoryProjectAccessor::new(&settings.application.actor).with_projects(seed_projects()));
    let store = ProjectStore::shared(&settings.application.actor);
    let service = ProjectServiceImpl::new(
        accessor,
        store.clone(),
        settings.cache.to_cache_config(),
    )
    .with_transition_enforcement(settings.workflow.enforce_transitions);

    let mut events = store.read().await.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if !matches!(event, StoreEvent::LoadingChanged(_)) {
                info!(?event, "store changed");
            }
        }
    });

    let projects = service
        .load_projects(&FilterCriteria::default(), &CancellationFlag::new())
        .await?;
    info!(count = projects.len(), "projects loaded");

    {
        let mut store = store.write().await;
        store.set_filters(FilterCriteria::default().with_status([
            StatusCode::InProgress,
            StatusCode::UnderReview,
            StatusCode::OnHold,
        ]));
        store.set_sort(SortSpec::new(SortField::Progress, SortDirection::Desc));
        println!("Open projects by progress:");
        for project in store.visible() {
            println!(
                "  #{:<3} {:<28} {:<14} {:>3}%",
                project.id,
                project.name,
                project.status.to_string(),
                project.progress.map(|p| p.percent()).unwrap_or(0),
            );
        }
        store.clear_filters();
    }

    let created = service
        .create_project(
            &NewProject::new("Records Retention Policy")
                .with_owner("Priya Nair")
                .with_priority(Priority::High)
                .with_progress(Progress::saturating(5))
                .with_tags(["Records"]),
        )
        .await?;

    service.change_status(created.id, StatusCode::InProgress).await?;
    if let Err(e) = service.change_status(created.id, StatusCode::Approved).await {
        warn!(error = %e, "status change rejected");
    }

    let stalled: Vec<_> = store
        .read()
        .await
        .records()
        .iter()
        .filter(|p| p.status == StatusCode::OnHold)
        .map(|p| p.id)
        .collect();
    service
        .bulk_update(&stalled, &ProjectPatch::status(StatusCode::InProgress))
        .await?;

    let summary = service.load_summary().await?;
    println!();
    println!("Total projects:   {}", summary.total_projects);
    println!("Active:           {}", summary.active_projects);
    println!("Completed:        {}", summary.completed_projects);
    println!("On hold:          {}", summary.on_hold_projects);
    println!("Not started:      {}", summary.not_started_projects);
    println!("Average progress: {:.1}%", summary.average_progress);
    println!("Total budget:     {:.2}", summary.total_budget);

    drop(service);
    listener.abort();
    Ok(())
}
