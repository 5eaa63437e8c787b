//! Test harness for orchestrator scenarios.
//!
//! `TestHarness` owns a store bundle, a `FixedClock` pinned to a calendar
//! day and an orchestrator wired to both. The sqlite variant keeps its
//! database in a temporary directory that lives as long as the harness.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use shopfloor::config::Config;
use shopfloor::model::{Job, JobDraft, Machine, MachineDraft, Project, ProjectDraft};
use shopfloor::{
    CompletionOutcome, CompletionSummary, FixedClock, JobCompletionOrchestrator, MemoryBackend,
    ProgressReport, Stores,
};

use super::builders::ConfigBuilder;

pub const OPERATOR: &str = "operario-1";

pub struct TestHarness {
    pub clock: Arc<FixedClock>,
    pub stores: Stores,
    pub orchestrator: JobCompletionOrchestrator,
    /// Database file of the sqlite variant.
    pub db_path: Option<PathBuf>,
    temp_dir: Option<TempDir>,
}

impl TestHarness {
    /// In-memory stores, default configuration, today = 2024-05-01.
    pub fn new() -> Self {
        Self::on_date("2024-05-01")
    }

    pub fn on_date(date: &str) -> Self {
        Self::with_config(&Config::default(), date)
    }

    pub fn with_config(config: &Config, date: &str) -> Self {
        let clock = Arc::new(FixedClock::on_date(date).expect("Invalid test date"));
        let stores = Stores::from_backend(Arc::new(MemoryBackend::new(clock.clone())));
        Self::assemble(stores, clock, config, None, None)
    }

    /// Sqlite-backed stores in a fresh temporary directory.
    pub fn sqlite(date: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("data").join("shopfloor.db");
        let config = ConfigBuilder::new()
            .sqlite(path.to_str().expect("Non-UTF-8 temp path"))
            .build();

        let clock = Arc::new(FixedClock::on_date(date).expect("Invalid test date"));
        let stores =
            Stores::open(&config.storage, clock.clone()).expect("Failed to open sqlite stores");
        Self::assemble(stores, clock, &config, Some(path), Some(temp_dir))
    }

    fn assemble(
        stores: Stores,
        clock: Arc<FixedClock>,
        config: &Config,
        db_path: Option<PathBuf>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let orchestrator =
            JobCompletionOrchestrator::from_config(stores.clone(), clock.clone(), config);
        Self {
            clock,
            stores,
            orchestrator,
            db_path,
            temp_dir,
        }
    }

    pub async fn project(&self, name: &str, deadline: &str) -> Project {
        self.stores
            .projects
            .create(ProjectDraft::new(name, deadline))
            .await
            .expect("Failed to create project")
    }

    pub async fn machine(&self, draft: MachineDraft) -> Machine {
        self.stores
            .machines
            .create(draft)
            .await
            .expect("Failed to create machine")
    }

    pub async fn job(&self, draft: JobDraft) -> Job {
        self.stores.jobs.create(draft).await.expect("Failed to create job")
    }

    pub async fn job_by_id(&self, id: &str) -> Job {
        self.stores
            .jobs
            .get_by_id(id)
            .await
            .expect("Job lookup failed")
            .expect("Job not found")
    }

    pub async fn machine_by_id(&self, id: &str) -> Machine {
        self.stores
            .machines
            .get_by_id(id)
            .await
            .expect("Machine lookup failed")
            .expect("Machine not found")
    }

    /// Starts `job_id` on `machine_id` and asserts it started.
    pub async fn start(&self, job_id: &str, machine_id: &str) -> Job {
        self.orchestrator
            .start_job(job_id, machine_id, OPERATOR)
            .await
            .expect("start_job failed")
            .expect("Job was not started")
    }

    /// Reports `job_id` complete and returns the summary.
    pub async fn complete(&self, job_id: &str) -> CompletionSummary {
        let outcome = self
            .orchestrator
            .report_progress(ProgressReport::complete(job_id, 0.0, OPERATOR))
            .await
            .expect("report_progress failed");
        match outcome {
            CompletionOutcome::Completed(summary) => summary,
            other => panic!("Expected completion, got {:?}", other),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
