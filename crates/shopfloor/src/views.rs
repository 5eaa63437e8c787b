//! Read-only derivations for machine dashboards. Nothing here mutates state.

use crate::model::{Job, Machine};

/// Jobs waiting on `machine`: assigned to it, not COMPLETED and not the job it
/// is running, ordered by priority index (missing index sorts as 0).
///
/// The sort is stable, so equal priorities keep the input order.
pub fn machine_queue<'a>(jobs: &'a [Job], machine: &Machine) -> Vec<&'a Job> {
    let mut queue: Vec<&Job> = jobs
        .iter()
        .filter(|j| j.assigned_machine_id.as_deref() == Some(machine.id.as_str()))
        .filter(|j| !j.is_completed())
        .filter(|j| machine.current_job_id.as_deref() != Some(j.id.as_str()))
        .collect();
    queue.sort_by_key(|j| j.priority_index.unwrap_or(0));
    queue
}

/// The job `machine_id` completed most recently.
pub fn last_completed<'a>(jobs: &'a [Job], machine_id: &str) -> Option<&'a Job> {
    jobs.iter()
        .filter(|j| j.assigned_machine_id.as_deref() == Some(machine_id) && j.is_completed())
        .filter_map(|j| j.completed_at.map(|at| (at, j)))
        .max_by_key(|(at, _)| *at)
        .map(|(_, j)| j)
}

/// Rounded completion percentage. 0 when the target is 0 or the ratio is not finite.
pub fn progress_percent(job: &Job) -> i64 {
    if job.target_quantity == 0.0 {
        return 0;
    }
    let ratio = job.completed_quantity / job.target_quantity * 100.0;
    if ratio.is_finite() {
        ratio.round() as i64
    } else {
        0
    }
}
