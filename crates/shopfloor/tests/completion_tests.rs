//! Job completion scenarios: sequencing, machine release, readiness alerts.

mod common;

use common::{JobBuilder, MachineBuilder, TestHarness};

use shopfloor::model::{AlertSeverity, AlertType, JobStatus, MachineStatus, MachineType};
use shopfloor::sequencing::{
    all_upstream_complete, DOWNSTREAM_PRIORITY, DOWNSTREAM_PRODUCT_PREFIX,
};
use shopfloor::{Clock, CompletionOutcome, DownstreamAction, ProgressReport};

#[tokio::test]
async fn completing_last_forming_job_creates_panel_job() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let panel = h.machine(MachineBuilder::panel("M-PANEL").build()).await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;
    let j2 = h.job(JobBuilder::new(&p1.id).build()).await;

    let first = h.complete(&j1.id).await;
    assert_eq!(first.downstream, DownstreamAction::Waiting);
    let jobs = h.stores.jobs.list_by_project(&p1.id).await.unwrap();
    assert!(!all_upstream_complete(&jobs, &p1.id, MachineType::Forming, None));

    let second = h.complete(&j2.id).await;
    let DownstreamAction::Created { job_id } = second.downstream else {
        panic!("expected a downstream job, got {:?}", second.downstream);
    };
    let jobs = h.stores.jobs.list_by_project(&p1.id).await.unwrap();
    assert!(all_upstream_complete(&jobs, &p1.id, MachineType::Forming, None));

    let j3 = h.job_by_id(&job_id).await;
    assert!(j3.product_name.starts_with(DOWNSTREAM_PRODUCT_PREFIX));
    assert_eq!(j3.product_name, format!("{}P1", DOWNSTREAM_PRODUCT_PREFIX));
    assert_eq!(j3.target_quantity, 1.0);
    assert_eq!(j3.completed_quantity, 0.0);
    assert_eq!(j3.status, JobStatus::Pending);
    assert_eq!(j3.machine_type, MachineType::PanelAssembly);
    assert_eq!(j3.assigned_machine_id.as_deref(), Some(panel.id.as_str()));
    assert_eq!(j3.priority_index, Some(DOWNSTREAM_PRIORITY));

    // The panel job is still open, so the project is not ready yet.
    assert!(!second.project_ready);
    assert!(h.stores.alerts.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn rework_reactivates_existing_panel_job() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let panel = h.machine(MachineBuilder::panel("M-PANEL").build()).await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;
    let existing = h
        .job(
            JobBuilder::new(&p1.id)
                .machine_type(MachineType::PanelAssembly)
                .assigned_to(&panel.id)
                .status(JobStatus::Completed)
                .build(),
        )
        .await;

    let summary = h.complete(&j1.id).await;
    assert_eq!(
        summary.downstream,
        DownstreamAction::Reactivated {
            job_id: existing.id.clone()
        }
    );
    assert_eq!(h.job_by_id(&existing.id).await.status, JobStatus::Pending);

    let panel_jobs: Vec<_> = h
        .stores
        .jobs
        .list_by_project(&p1.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|j| j.machine_type == MachineType::PanelAssembly)
        .collect();
    assert_eq!(panel_jobs.len(), 1);
}

#[tokio::test]
async fn no_panel_machine_means_no_downstream_job() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;

    let summary = h.complete(&j1.id).await;
    assert_eq!(summary.downstream, DownstreamAction::NoDownstreamMachine);
    assert_eq!(h.stores.jobs.list_by_project(&p1.id).await.unwrap().len(), 1);
    // The only job is done, so the project is ready regardless.
    assert!(summary.project_ready);
}

#[tokio::test]
async fn panel_job_queues_behind_existing_work() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let other = h.project("P0", "2024-06-01").await;
    let panel = h.machine(MachineBuilder::panel("M-PANEL").build()).await;
    h.job(
        JobBuilder::new(&other.id)
            .machine_type(MachineType::PanelAssembly)
            .assigned_to(&panel.id)
            .priority(1200)
            .build(),
    )
    .await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;

    let summary = h.complete(&j1.id).await;
    let DownstreamAction::Created { job_id } = summary.downstream else {
        panic!("expected a downstream job");
    };
    assert_eq!(h.job_by_id(&job_id).await.priority_index, Some(1201));
}

#[tokio::test]
async fn completion_releases_machine_even_while_waiting() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let forming = h.machine(MachineBuilder::forming("CF-1").build()).await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;
    h.job(JobBuilder::new(&p1.id).build()).await;

    h.start(&j1.id, &forming.id).await;
    assert_eq!(h.machine_by_id(&forming.id).await.status, MachineStatus::Running);

    let summary = h.complete(&j1.id).await;
    assert_eq!(summary.downstream, DownstreamAction::Waiting);
    assert_eq!(summary.released_machine_id.as_deref(), Some(forming.id.as_str()));

    let machine = h.machine_by_id(&forming.id).await;
    assert_eq!(machine.status, MachineStatus::Idle);
    assert!(machine.current_job_id.is_none());

    let events = h.stores.events.list_all().await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.source == forming.id));
}

#[tokio::test]
async fn completion_snaps_quantity_and_keeps_notes() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let j1 = h.job(JobBuilder::new(&p1.id).target(40.0).build()).await;

    let outcome = h
        .orchestrator
        .report_progress(ProgressReport::complete(&j1.id, 37.5, "ana").with_notes("bobina nueva"))
        .await
        .unwrap();
    let CompletionOutcome::Completed(summary) = outcome else {
        panic!("expected completion");
    };

    let stored = h.job_by_id(&j1.id).await;
    assert_eq!(stored, summary.job);
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.completed_quantity, 40.0);
    assert_eq!(stored.notes.as_deref(), Some("bobina nueva"));
    assert_eq!(stored.completed_at, Some(h.clock.now()));
}

#[tokio::test]
async fn partial_progress_has_no_side_effects() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-05-01").await;
    h.machine(MachineBuilder::dispatch("Carga").operator("o1").build())
        .await;
    let j1 = h.job(JobBuilder::new(&p1.id).build()).await;

    let outcome = h
        .orchestrator
        .report_progress(ProgressReport::progress(&j1.id, 5.0, "ana"))
        .await
        .unwrap();
    assert!(matches!(outcome, CompletionOutcome::ProgressUpdated { .. }));

    let stored = h.job_by_id(&j1.id).await;
    assert_eq!(stored.completed_quantity, 5.0);
    assert_eq!(stored.status, j1.status);
    assert!(stored.completed_at.is_none());
    assert!(h.stores.alerts.list_all().await.unwrap().is_empty());
    assert!(h.stores.messages.list_all().await.unwrap().is_empty());
    assert!(h.stores.events.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn finishing_project_raises_one_alert() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let j1 = h
        .job(JobBuilder::new(&p1.id).machine_type(MachineType::Welding).build())
        .await;
    let j2 = h
        .job(JobBuilder::new(&p1.id).machine_type(MachineType::Paint).build())
        .await;

    let first = h.complete(&j1.id).await;
    assert!(!first.project_ready);
    assert!(first.alert_id.is_none());

    let second = h.complete(&j2.id).await;
    assert!(second.project_ready);

    let alerts = h.stores.alerts.list_all().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(second.alert_id.as_deref(), Some(alerts[0].id.as_str()));
    assert_eq!(alerts[0].alert_type, AlertType::ReadyForDelivery);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].related_id.as_deref(), Some(p1.id.as_str()));
    assert!(alerts[0].message.contains("P1"));
}

#[tokio::test]
async fn recompleting_ready_project_duplicates_alert() {
    let h = TestHarness::new();
    let p1 = h.project("P1", "2024-06-15").await;
    let j1 = h
        .job(JobBuilder::new(&p1.id).machine_type(MachineType::Welding).build())
        .await;

    h.complete(&j1.id).await;
    h.complete(&j1.id).await;

    assert_eq!(h.stores.alerts.list_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn custom_sequencing_types_are_honoured() {
    use common::ConfigBuilder;

    let config = ConfigBuilder::new()
        .upstream(MachineType::Cutting)
        .downstream(MachineType::Welding)
        .build();
    let h = TestHarness::with_config(&config, "2024-05-01");
    let p1 = h.project("P1", "2024-06-15").await;
    let welder = h
        .machine(MachineBuilder::new("SOLD-1", MachineType::Welding).build())
        .await;
    let cut = h
        .job(JobBuilder::new(&p1.id).machine_type(MachineType::Cutting).build())
        .await;

    let summary = h.complete(&cut.id).await;
    let DownstreamAction::Created { job_id } = summary.downstream else {
        panic!("expected a downstream job");
    };
    let created = h.job_by_id(&job_id).await;
    assert_eq!(created.machine_type, MachineType::Welding);
    assert_eq!(created.assigned_machine_id.as_deref(), Some(welder.id.as_str()));
}
