//! Pure sequencing rules: when a downstream stage may start and what it
//! looks like. Nothing here touches a store.

use crate::model::{Job, JobDraft, JobStatus, MachineType};

/// Product name prefix of a synthesized downstream job; the project name follows.
pub const DOWNSTREAM_PRODUCT_PREFIX: &str = "Panelizado - ";

/// Unit of measure for a downstream job: one per project.
pub const DOWNSTREAM_UNIT: &str = "proyecto";

/// Queue position given to downstream jobs, after ordinary queued work.
pub const DOWNSTREAM_PRIORITY: i64 = 999;

/// True iff the project has at least one `upstream` job and every one of them
/// is COMPLETED or is `just_completed`.
///
/// `just_completed` covers the job being completed right now, whose new
/// status the caller's job list may not show yet. A project with no upstream
/// jobs has nothing to gate, so the answer is false.
pub fn all_upstream_complete(
    jobs: &[Job],
    project_id: &str,
    upstream: MachineType,
    just_completed: Option<&str>,
) -> bool {
    let mut upstream_jobs = jobs
        .iter()
        .filter(|j| j.project_id == project_id && j.machine_type == upstream)
        .peekable();

    if upstream_jobs.peek().is_none() {
        return false;
    }

    upstream_jobs.all(|j| j.is_completed() || Some(j.id.as_str()) == just_completed)
}

/// True iff the project has at least one job and all of them are COMPLETED.
pub fn all_project_jobs_complete(jobs: &[Job], project_id: &str) -> bool {
    let mut project_jobs = jobs.iter().filter(|j| j.project_id == project_id).peekable();

    if project_jobs.peek().is_none() {
        return false;
    }

    project_jobs.all(Job::is_completed)
}

/// The single downstream job of a project, if one was ever created.
pub fn find_downstream_job<'a>(
    jobs: &'a [Job],
    project_id: &str,
    downstream: MachineType,
) -> Option<&'a Job> {
    jobs.iter()
        .find(|j| j.project_id == project_id && j.machine_type == downstream)
}

/// Draft for the downstream stage of a project. The store assigns id and timestamps.
pub fn build_downstream_job_payload(
    project_id: &str,
    project_name: &str,
    downstream_machine_id: &str,
    downstream: MachineType,
) -> JobDraft {
    JobDraft {
        project_id: project_id.to_string(),
        product_name: format!("{}{}", DOWNSTREAM_PRODUCT_PREFIX, project_name),
        machine_type: downstream,
        assigned_machine_id: Some(downstream_machine_id.to_string()),
        target_quantity: 1.0,
        completed_quantity: 0.0,
        unit: DOWNSTREAM_UNIT.to_string(),
        status: JobStatus::Pending,
        priority_index: Some(DOWNSTREAM_PRIORITY),
        operator_ids: Vec::new(),
        workflow_stages: Vec::new(),
    }
}

/// Priority index that queues a new job behind everything in `queue`,
/// never earlier than `floor`.
pub fn next_priority_index(queue: &[Job], floor: i64) -> i64 {
    queue
        .iter()
        .filter_map(|j| j.priority_index)
        .max()
        .map_or(floor, |max| (max + 1).max(floor))
}
