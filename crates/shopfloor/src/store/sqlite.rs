//! Store backend persisted in a local SQLite database.
//!
//! Database calls are synchronous and sub-millisecond, so they run inline
//! inside the async trait methods. List-valued fields are stored as JSON text.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    AlertStore, EventStore, JobStore, MachineStore, MessageStore, ProjectStore, StoreResult,
};
use crate::db::job_repo::{self, JobFilter, JobRow};
use crate::db::machine_repo::{self, MachineRow};
use crate::db::{
    alert_repo, event_repo, format_timestamp, message_repo, parse_timestamp, project_repo,
    Database,
};
use crate::error::StoreError;
use crate::model::{
    ActivityEvent, AlertDraft, EventDraft, Job, JobDraft, JobPatch, JobStatus, Machine,
    MachineDraft, MachinePatch, MachineStatus, MachineType, MessageDraft, Project, ProjectDraft,
    SystemAlert, SystemMessage,
};
use crate::Clock;

fn to_json<T: serde::Serialize>(value: &T, field: &'static str) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization { field, source })
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str, field: &'static str) -> StoreResult<T> {
    serde_json::from_str(s).map_err(|source| StoreError::Serialization { field, source })
}

fn job_from_row(row: JobRow) -> StoreResult<Job> {
    Ok(Job {
        status: JobStatus::parse(&row.status, &row.id),
        machine_type: MachineType::parse(&row.machine_type),
        operator_ids: from_json(&row.operator_ids, "operator_ids")?,
        workflow_stages: from_json(&row.workflow_stages, "workflow_stages")?,
        created_at: parse_timestamp(&row.created_at),
        completed_at: row.completed_at.as_deref().map(parse_timestamp),
        id: row.id,
        project_id: row.project_id,
        product_name: row.product_name,
        assigned_machine_id: row.assigned_machine_id,
        target_quantity: row.target_quantity,
        completed_quantity: row.completed_quantity,
        unit: row.unit,
        priority_index: row.priority_index,
        notes: row.notes,
    })
}

fn job_to_row(job: &Job) -> StoreResult<JobRow> {
    Ok(JobRow {
        id: job.id.clone(),
        project_id: job.project_id.clone(),
        product_name: job.product_name.clone(),
        machine_type: job.machine_type.as_str().to_string(),
        assigned_machine_id: job.assigned_machine_id.clone(),
        target_quantity: job.target_quantity,
        completed_quantity: job.completed_quantity,
        unit: job.unit.clone(),
        status: job.status.as_str().to_string(),
        priority_index: job.priority_index,
        operator_ids: to_json(&job.operator_ids, "operator_ids")?,
        workflow_stages: to_json(&job.workflow_stages, "workflow_stages")?,
        notes: job.notes.clone(),
        created_at: format_timestamp(job.created_at),
        completed_at: job.completed_at.map(format_timestamp),
    })
}

fn machine_from_row(row: MachineRow) -> StoreResult<Machine> {
    Ok(Machine {
        status: MachineStatus::parse(&row.status, &row.id),
        machine_type: MachineType::parse(&row.machine_type),
        operator_ids: from_json(&row.operator_ids, "operator_ids")?,
        id: row.id,
        name: row.name,
        current_job_id: row.current_job_id,
    })
}

fn machine_to_row(machine: &Machine) -> StoreResult<MachineRow> {
    Ok(MachineRow {
        id: machine.id.clone(),
        name: machine.name.clone(),
        machine_type: machine.machine_type.as_str().to_string(),
        status: machine.status.as_str().to_string(),
        operator_ids: to_json(&machine.operator_ids, "operator_ids")?,
        current_job_id: machine.current_job_id.clone(),
    })
}

/// All six stores over one SQLite database.
pub struct SqliteBackend {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SqliteBackend {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn query_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<Job>> {
        job_repo::query(&self.db, filter)?
            .into_iter()
            .map(job_from_row)
            .collect()
    }
}

#[async_trait]
impl JobStore for SqliteBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Job>> {
        job_repo::find_by_id(&self.db, id)?
            .map(job_from_row)
            .transpose()
    }

    async fn update(&self, id: &str, patch: JobPatch) -> StoreResult<Option<Job>> {
        let Some(row) = job_repo::find_by_id(&self.db, id)? else {
            return Ok(None);
        };
        let mut job = job_from_row(row)?;
        job.apply(&patch);
        job_repo::update(&self.db, &job_to_row(&job)?)?;
        Ok(Some(job))
    }

    async fn create(&self, draft: JobDraft) -> StoreResult<Job> {
        let job = Job::from_draft(Uuid::new_v4().to_string(), draft, self.clock.now());
        job_repo::insert(&self.db, &job_to_row(&job)?)?;
        log::debug!("Created job {} for project {}", job.id, job.project_id);
        Ok(job)
    }

    async fn list_by_project(&self, project_id: &str) -> StoreResult<Vec<Job>> {
        self.query_jobs(&JobFilter {
            project_id: Some(project_id.to_string()),
            ..Default::default()
        })
    }

    async fn list_by_machine(&self, machine_id: &str) -> StoreResult<Vec<Job>> {
        self.query_jobs(&JobFilter {
            assigned_machine_id: Some(machine_id.to_string()),
            ..Default::default()
        })
    }

    async fn list_all(&self) -> StoreResult<Vec<Job>> {
        self.query_jobs(&JobFilter::default())
    }
}

#[async_trait]
impl MachineStore for SqliteBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Machine>> {
        machine_repo::find_by_id(&self.db, id)?
            .map(machine_from_row)
            .transpose()
    }

    async fn update(&self, id: &str, patch: MachinePatch) -> StoreResult<Option<Machine>> {
        let Some(row) = machine_repo::find_by_id(&self.db, id)? else {
            return Ok(None);
        };
        let mut machine = machine_from_row(row)?;
        machine.apply(&patch);
        machine_repo::update(&self.db, &machine_to_row(&machine)?)?;
        Ok(Some(machine))
    }

    async fn list_by_type(&self, machine_type: MachineType) -> StoreResult<Vec<Machine>> {
        machine_repo::list(&self.db, Some(machine_type.as_str()))?
            .into_iter()
            .map(machine_from_row)
            .collect()
    }

    async fn create(&self, draft: MachineDraft) -> StoreResult<Machine> {
        let machine = Machine::from_draft(Uuid::new_v4().to_string(), draft);
        machine_repo::insert(&self.db, &machine_to_row(&machine)?)?;
        Ok(machine)
    }

    async fn list_all(&self) -> StoreResult<Vec<Machine>> {
        machine_repo::list(&self.db, None)?
            .into_iter()
            .map(machine_from_row)
            .collect()
    }
}

#[async_trait]
impl ProjectStore for SqliteBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(project_repo::find_by_id(&self.db, id)?)
    }

    async fn create(&self, draft: ProjectDraft) -> StoreResult<Project> {
        let project = Project::from_draft(Uuid::new_v4().to_string(), draft);
        project_repo::insert(&self.db, &project)?;
        Ok(project)
    }

    async fn list_all(&self) -> StoreResult<Vec<Project>> {
        Ok(project_repo::list(&self.db)?)
    }
}

#[async_trait]
impl AlertStore for SqliteBackend {
    async fn create(&self, draft: AlertDraft) -> StoreResult<SystemAlert> {
        let alert = SystemAlert::from_draft(Uuid::new_v4().to_string(), draft, self.clock.now());
        alert_repo::insert(&self.db, &alert)?;
        Ok(alert)
    }

    async fn list_all(&self) -> StoreResult<Vec<SystemAlert>> {
        Ok(alert_repo::list(&self.db)?)
    }
}

#[async_trait]
impl MessageStore for SqliteBackend {
    async fn create(&self, draft: MessageDraft) -> StoreResult<SystemMessage> {
        let message =
            SystemMessage::from_draft(Uuid::new_v4().to_string(), draft, self.clock.now());
        message_repo::insert(&self.db, &message)?;
        Ok(message)
    }

    async fn list_all(&self) -> StoreResult<Vec<SystemMessage>> {
        Ok(message_repo::list(&self.db)?)
    }
}

#[async_trait]
impl EventStore for SqliteBackend {
    async fn create(&self, draft: EventDraft) -> StoreResult<ActivityEvent> {
        let event = ActivityEvent::from_draft(Uuid::new_v4().to_string(), draft, self.clock.now());
        event_repo::insert(&self.db, &event)?;
        Ok(event)
    }

    async fn list_all(&self) -> StoreResult<Vec<ActivityEvent>> {
        Ok(event_repo::list(&self.db)?)
    }
}
