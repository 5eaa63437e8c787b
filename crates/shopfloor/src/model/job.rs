//! Production jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::machine::MachineType;

/// Lifecycle status of a production job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Halted,
}

impl JobStatus {
    /// Wire representation used by the persisted backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Halted => "HALTED",
        }
    }

    /// Parses a wire string, defaulting to `Pending` for unknown values.
    pub fn parse(s: &str, job_id: &str) -> Self {
        match s {
            "PENDING" => JobStatus::Pending,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "HALTED" => JobStatus::Halted,
            other => {
                log::warn!(
                    "Unknown job status '{}' for job {}, defaulting to PENDING",
                    other,
                    job_id
                );
                JobStatus::Pending
            }
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a job's workflow checklist (cut, weld, paint, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStage {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

impl WorkflowStage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            completed: false,
        }
    }
}

/// A production job as held by the job store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Store-assigned identity.
    pub id: String,
    /// Owning project.
    pub project_id: String,
    /// Product or part being produced.
    pub product_name: String,
    /// Machine classification this job runs on.
    pub machine_type: MachineType,
    /// Machine the job is queued on, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_machine_id: Option<String>,
    pub target_quantity: f64,
    pub completed_quantity: f64,
    /// Unit of measure for the quantities.
    pub unit: String,
    pub status: JobStatus,
    /// Queue position on the assigned machine, lower runs sooner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workflow_stages: Vec<WorkflowStage>,
    /// Operator notes recorded on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Builds a job from a draft plus the identity and timestamp a store assigns.
    pub fn from_draft(id: String, draft: JobDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            project_id: draft.project_id,
            product_name: draft.product_name,
            machine_type: draft.machine_type,
            assigned_machine_id: draft.assigned_machine_id,
            target_quantity: draft.target_quantity,
            completed_quantity: draft.completed_quantity,
            unit: draft.unit,
            status: draft.status,
            priority_index: draft.priority_index,
            operator_ids: draft.operator_ids,
            workflow_stages: draft.workflow_stages,
            notes: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &JobPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(quantity) = patch.completed_quantity {
            self.completed_quantity = quantity;
        }
        if let Some(ref assigned) = patch.assigned_machine_id {
            self.assigned_machine_id = assigned.clone();
        }
        if let Some(priority) = patch.priority_index {
            self.priority_index = priority;
        }
        if let Some(ref notes) = patch.notes {
            self.notes = notes.clone();
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(ref stages) = patch.workflow_stages {
            self.workflow_stages = stages.clone();
        }
        if let Some(ref operators) = patch.operator_ids {
            self.operator_ids = operators.clone();
        }
    }
}

/// A job that has not been persisted yet (no identity, no timestamps).
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub project_id: String,
    pub product_name: String,
    pub machine_type: MachineType,
    pub assigned_machine_id: Option<String>,
    pub target_quantity: f64,
    pub completed_quantity: f64,
    pub unit: String,
    pub status: JobStatus,
    pub priority_index: Option<i64>,
    pub operator_ids: Vec<String>,
    pub workflow_stages: Vec<WorkflowStage>,
}

impl JobDraft {
    /// A pending draft with no progress and no machine assignment.
    pub fn new(
        project_id: &str,
        product_name: &str,
        machine_type: MachineType,
        target_quantity: f64,
        unit: &str,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            product_name: product_name.to_string(),
            machine_type,
            assigned_machine_id: None,
            target_quantity,
            completed_quantity: 0.0,
            unit: unit.to_string(),
            status: JobStatus::Pending,
            priority_index: None,
            operator_ids: Vec::new(),
            workflow_stages: Vec::new(),
        }
    }
}

/// Partial update for a job.
///
/// Outer `None` leaves a field untouched; for optional fields the inner
/// `Option` is the new value (so `Some(None)` clears it).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub completed_quantity: Option<f64>,
    pub assigned_machine_id: Option<Option<String>>,
    pub priority_index: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub workflow_stages: Option<Vec<WorkflowStage>>,
    pub operator_ids: Option<Vec<String>>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(completed_quantity: f64) -> Self {
        Self {
            completed_quantity: Some(completed_quantity),
            ..Default::default()
        }
    }
}
