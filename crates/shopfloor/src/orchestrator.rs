//! The state-transition entry point for operator job reports.
//!
//! Completing a job fans out in a fixed order: job update, audit event,
//! machine release, downstream sequencing, project readiness (alert plus
//! dispatch notice). Each step commits on its own; there is no rollback if a
//! later step fails.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{Config, DispatchConfig, SequencingConfig};
use crate::dispatch::{DispatchNotifier, DispatchOutcome};
use crate::model::{AlertDraft, EventDraft, Job, JobPatch, JobStatus, MachinePatch};
use crate::sequencing::{
    all_project_jobs_complete, all_upstream_complete, build_downstream_job_payload,
    find_downstream_job, next_priority_index, DOWNSTREAM_PRIORITY,
};
use crate::store::{StoreResult, Stores};
use crate::Clock;

/// One operator report against a job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub job_id: String,
    pub quantity: f64,
    pub is_complete: bool,
    pub notes: Option<String>,
    /// Acting user, recorded on the audit event.
    pub user: String,
}

impl ProgressReport {
    /// A partial-progress report.
    pub fn progress(job_id: &str, quantity: f64, user: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            quantity,
            is_complete: false,
            notes: None,
            user: user.to_string(),
        }
    }

    /// A completion report.
    pub fn complete(job_id: &str, quantity: f64, user: &str) -> Self {
        Self {
            is_complete: true,
            ..Self::progress(job_id, quantity, user)
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }
}

/// What happened to the downstream stage of the project.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum DownstreamAction {
    /// The completed job is not an upstream job.
    NotApplicable,
    /// Other upstream jobs of the project are still open.
    Waiting,
    /// Upstream is done but no downstream machine exists.
    NoDownstreamMachine,
    Created { job_id: String },
    Reactivated { job_id: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub job: Job,
    pub released_machine_id: Option<String>,
    pub downstream: DownstreamAction,
    /// Every job of the project is COMPLETED.
    pub project_ready: bool,
    pub alert_id: Option<String>,
    pub dispatch: Option<DispatchOutcome>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CompletionOutcome {
    /// The job id did not resolve. Nothing was changed.
    JobNotFound,
    ProgressUpdated { job: Job },
    Completed(CompletionSummary),
}

/// Clamps a reported quantity to a finite, non-negative number.
fn sanitize_quantity(quantity: f64, job_id: &str) -> f64 {
    if quantity.is_finite() && quantity >= 0.0 {
        quantity
    } else {
        warn!(job_id, quantity, "Invalid reported quantity, using 0");
        0.0
    }
}

pub struct JobCompletionOrchestrator {
    stores: Stores,
    clock: Arc<dyn Clock>,
    sequencing: SequencingConfig,
    notifier: DispatchNotifier,
}

impl JobCompletionOrchestrator {
    pub fn new(
        stores: Stores,
        clock: Arc<dyn Clock>,
        sequencing: SequencingConfig,
        dispatch: DispatchConfig,
    ) -> Self {
        let notifier = DispatchNotifier::new(
            stores.machines.clone(),
            stores.messages.clone(),
            clock.clone(),
            sequencing.dispatch_machine_type,
            dispatch,
        );
        Self {
            stores,
            clock,
            sequencing,
            notifier,
        }
    }

    pub fn from_config(stores: Stores, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self::new(
            stores,
            clock,
            config.sequencing.clone(),
            config.dispatch.clone(),
        )
    }

    /// Puts a PENDING or HALTED job to work on `machine_id`.
    ///
    /// A job the machine was running is halted, and a machine the job was
    /// running on is released, so machine and job pointers stay paired.
    ///
    /// Returns the updated job, or `None` when the job or the machine does not
    /// resolve or the job is already COMPLETED.
    pub async fn start_job(
        &self,
        job_id: &str,
        machine_id: &str,
        user: &str,
    ) -> StoreResult<Option<Job>> {
        let span = info_span!("start_job", job_id, machine_id);
        self.start_job_inner(job_id, machine_id, user)
            .instrument(span)
            .await
    }

    async fn start_job_inner(
        &self,
        job_id: &str,
        machine_id: &str,
        user: &str,
    ) -> StoreResult<Option<Job>> {
        let Some(job) = self.stores.jobs.get_by_id(job_id).await? else {
            warn!("Job not found, nothing to start");
            return Ok(None);
        };
        let Some(machine) = self.stores.machines.get_by_id(machine_id).await? else {
            warn!("Machine not found, job not started");
            return Ok(None);
        };

        if job.is_completed() {
            warn!("Job already completed, not restarting");
            return Ok(None);
        }

        if let Some(current) = machine
            .current_job_id
            .as_deref()
            .filter(|current| *current != job.id)
        {
            self.halt_displaced(current).await?;
        }
        if let Some(previous) = job
            .assigned_machine_id
            .as_deref()
            .filter(|previous| *previous != machine.id)
        {
            self.release_if_running(previous, &job.id).await?;
        }

        let patch = JobPatch {
            status: Some(JobStatus::InProgress),
            assigned_machine_id: Some(Some(machine.id.clone())),
            ..Default::default()
        };
        let Some(started) = self.stores.jobs.update(&job.id, patch).await? else {
            return Ok(None);
        };

        self.stores
            .machines
            .update(&machine.id, MachinePatch::run(&started.id))
            .await?;

        self.stores
            .events
            .create(EventDraft::info(
                Some(&machine.id),
                format!(
                    "Job {} started on {} by {}",
                    started.product_name, machine.name, user
                ),
                user,
            ))
            .await?;

        info!("Job started");
        Ok(Some(started))
    }

    /// The machine's running job loses its slot; it goes back to HALTED so
    /// it is not left IN_PROGRESS with no machine pointing at it.
    async fn halt_displaced(&self, job_id: &str) -> StoreResult<()> {
        let Some(displaced) = self.stores.jobs.get_by_id(job_id).await? else {
            return Ok(());
        };
        if displaced.status == JobStatus::InProgress {
            warn!(previous_job_id = job_id, "Machine was running another job, halting it");
            self.stores
                .jobs
                .update(job_id, JobPatch::status(JobStatus::Halted))
                .await?;
        }
        Ok(())
    }

    /// Frees a machine the job is moving away from, if it still runs that job.
    async fn release_if_running(&self, machine_id: &str, job_id: &str) -> StoreResult<()> {
        let Some(previous) = self.stores.machines.get_by_id(machine_id).await? else {
            return Ok(());
        };
        if previous.current_job_id.as_deref() == Some(job_id) {
            debug!(previous_machine_id = machine_id, "Releasing previous machine");
            self.stores
                .machines
                .update(machine_id, MachinePatch::release())
                .await?;
        }
        Ok(())
    }

    /// Applies an operator report.
    ///
    /// A partial report only updates the completed quantity. A completion
    /// report runs the full completion sequence. Unknown job ids are a no-op.
    pub async fn report_progress(&self, report: ProgressReport) -> StoreResult<CompletionOutcome> {
        let span = info_span!(
            "report_progress",
            job_id = %report.job_id,
            is_complete = report.is_complete
        );
        self.report_progress_inner(report).instrument(span).await
    }

    async fn report_progress_inner(
        &self,
        report: ProgressReport,
    ) -> StoreResult<CompletionOutcome> {
        let Some(job) = self.stores.jobs.get_by_id(&report.job_id).await? else {
            warn!("Job not found, ignoring report");
            return Ok(CompletionOutcome::JobNotFound);
        };

        let quantity = sanitize_quantity(report.quantity, &job.id);

        if !report.is_complete {
            let updated = self
                .stores
                .jobs
                .update(&job.id, JobPatch::progress(quantity))
                .await?;
            debug!(quantity, "Progress updated");
            return Ok(match updated {
                Some(job) => CompletionOutcome::ProgressUpdated { job },
                None => CompletionOutcome::JobNotFound,
            });
        }

        let patch = JobPatch {
            status: Some(JobStatus::Completed),
            completed_quantity: Some(job.target_quantity),
            completed_at: Some(Some(self.clock.now())),
            notes: report.notes.clone().map(Some),
            ..Default::default()
        };
        let Some(completed) = self.stores.jobs.update(&job.id, patch).await? else {
            warn!("Job disappeared before completion");
            return Ok(CompletionOutcome::JobNotFound);
        };

        self.stores
            .events
            .create(EventDraft::info(
                completed.assigned_machine_id.as_deref(),
                format!(
                    "Job {} completed ({} {}) by {}",
                    completed.product_name, completed.target_quantity, completed.unit, report.user
                ),
                &report.user,
            ))
            .await?;

        let released_machine_id = self.release_machine(&completed).await?;
        let downstream = self.sequence_downstream(&completed).await?;

        let project_jobs = self
            .stores
            .jobs
            .list_by_project(&completed.project_id)
            .await?;
        let project_ready = all_project_jobs_complete(&project_jobs, &completed.project_id);

        let (alert_id, dispatch) = if project_ready {
            self.announce_ready(&completed.project_id).await?
        } else {
            (None, None)
        };

        info!(
            ?downstream,
            project_ready,
            released = released_machine_id.is_some(),
            "Job completed"
        );

        Ok(CompletionOutcome::Completed(CompletionSummary {
            job: completed,
            released_machine_id,
            downstream,
            project_ready,
            alert_id,
            dispatch,
        }))
    }

    /// Frees the job's machine. Returns the machine id when one was released.
    async fn release_machine(&self, job: &Job) -> StoreResult<Option<String>> {
        let Some(machine_id) = job.assigned_machine_id.as_deref() else {
            return Ok(None);
        };

        match self
            .stores
            .machines
            .update(machine_id, MachinePatch::release())
            .await?
        {
            Some(machine) => {
                debug!(machine_id = %machine.id, "Machine released");
                Ok(Some(machine.id))
            }
            None => {
                warn!(machine_id, "Assigned machine not found, nothing to release");
                Ok(None)
            }
        }
    }

    async fn sequence_downstream(&self, completed: &Job) -> StoreResult<DownstreamAction> {
        let upstream = self.sequencing.upstream_machine_type;
        let downstream = self.sequencing.downstream_machine_type;

        if completed.machine_type != upstream {
            return Ok(DownstreamAction::NotApplicable);
        }

        let project_jobs = self
            .stores
            .jobs
            .list_by_project(&completed.project_id)
            .await?;
        if !all_upstream_complete(
            &project_jobs,
            &completed.project_id,
            upstream,
            Some(&completed.id),
        ) {
            return Ok(DownstreamAction::Waiting);
        }

        let Some(machine) = self
            .stores
            .machines
            .list_by_type(downstream)
            .await?
            .into_iter()
            .next()
        else {
            debug!(%downstream, "No downstream machine, skipping sequencing");
            return Ok(DownstreamAction::NoDownstreamMachine);
        };

        if let Some(existing) = find_downstream_job(&project_jobs, &completed.project_id, downstream)
        {
            self.stores
                .jobs
                .update(&existing.id, JobPatch::status(JobStatus::Pending))
                .await?;
            info!(downstream_job_id = %existing.id, "Downstream job reactivated");
            return Ok(DownstreamAction::Reactivated {
                job_id: existing.id.clone(),
            });
        }

        let project_name = match self.stores.projects.get_by_id(&completed.project_id).await? {
            Some(project) => project.name,
            None => {
                warn!(project_id = %completed.project_id, "Project not found, labelling downstream job by id");
                completed.project_id.clone()
            }
        };

        let queue = self.stores.jobs.list_by_machine(&machine.id).await?;
        let mut draft =
            build_downstream_job_payload(&completed.project_id, &project_name, &machine.id, downstream);
        draft.priority_index = Some(next_priority_index(&queue, DOWNSTREAM_PRIORITY));

        let created = self.stores.jobs.create(draft).await?;
        info!(downstream_job_id = %created.id, machine_id = %machine.id, "Downstream job created");
        Ok(DownstreamAction::Created { job_id: created.id })
    }

    /// Raises the delivery alert and notifies dispatch for a finished project.
    async fn announce_ready(
        &self,
        project_id: &str,
    ) -> StoreResult<(Option<String>, Option<DispatchOutcome>)> {
        let Some(project) = self.stores.projects.get_by_id(project_id).await? else {
            warn!(project_id, "Project complete but not found, no alert raised");
            return Ok((None, None));
        };

        let alert = self
            .stores
            .alerts
            .create(AlertDraft::ready_for_delivery(&project.id, &project.name))
            .await?;
        info!(project_id, alert_id = %alert.id, "Project ready for delivery");

        let dispatch = self.notifier.notify_dispatch_team(&project).await?;
        Ok((Some(alert.id), Some(dispatch)))
    }
}
