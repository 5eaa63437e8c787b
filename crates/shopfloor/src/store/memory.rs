//! In-process store backend.
//!
//! Each collection is a `HashMap` behind a `std::sync::RwLock`. Lock
//! poisoning is recovered from rather than propagated; the maps hold plain
//! data, so a panicked writer cannot leave them half-updated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    AlertStore, EventStore, JobStore, MachineStore, MessageStore, ProjectStore, StoreResult,
};
use crate::model::{
    ActivityEvent, AlertDraft, EventDraft, Job, JobDraft, JobPatch, Machine, MachineDraft,
    MachinePatch, MachineType, MessageDraft, Project, ProjectDraft, SystemAlert, SystemMessage,
};
use crate::Clock;

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Memory store {} lock was poisoned, recovering", name);
            poisoned.into_inner()
        }
    }
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Memory store {} lock was poisoned, recovering", name);
            poisoned.into_inner()
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// All six stores backed by in-memory maps.
pub struct MemoryBackend {
    clock: Arc<dyn Clock>,
    jobs: RwLock<HashMap<String, Job>>,
    machines: RwLock<HashMap<String, Machine>>,
    projects: RwLock<HashMap<String, Project>>,
    alerts: RwLock<Vec<SystemAlert>>,
    messages: RwLock<Vec<SystemMessage>>,
    events: RwLock<Vec<ActivityEvent>>,
}

impl MemoryBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: RwLock::new(HashMap::new()),
            machines: RwLock::new(HashMap::new()),
            projects: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
        }
    }

    /// Jobs matching `pred`, oldest first.
    fn jobs_where(&self, pred: impl Fn(&Job) -> bool) -> Vec<Job> {
        let jobs = read(&self.jobs, "jobs");
        let mut result: Vec<Job> = jobs.values().filter(|j| pred(j)).cloned().collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        result
    }

    fn machines_where(&self, pred: impl Fn(&Machine) -> bool) -> Vec<Machine> {
        let machines = read(&self.machines, "machines");
        let mut result: Vec<Machine> = machines.values().filter(|m| pred(m)).cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        result
    }
}

#[async_trait]
impl JobStore for MemoryBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Job>> {
        Ok(read(&self.jobs, "jobs").get(id).cloned())
    }

    async fn update(&self, id: &str, patch: JobPatch) -> StoreResult<Option<Job>> {
        let mut jobs = write(&self.jobs, "jobs");
        Ok(jobs.get_mut(id).map(|job| {
            job.apply(&patch);
            job.clone()
        }))
    }

    async fn create(&self, draft: JobDraft) -> StoreResult<Job> {
        let job = Job::from_draft(new_id(), draft, self.clock.now());
        write(&self.jobs, "jobs").insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn list_by_project(&self, project_id: &str) -> StoreResult<Vec<Job>> {
        Ok(self.jobs_where(|j| j.project_id == project_id))
    }

    async fn list_by_machine(&self, machine_id: &str) -> StoreResult<Vec<Job>> {
        Ok(self.jobs_where(|j| j.assigned_machine_id.as_deref() == Some(machine_id)))
    }

    async fn list_all(&self) -> StoreResult<Vec<Job>> {
        Ok(self.jobs_where(|_| true))
    }
}

#[async_trait]
impl MachineStore for MemoryBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Machine>> {
        Ok(read(&self.machines, "machines").get(id).cloned())
    }

    async fn update(&self, id: &str, patch: MachinePatch) -> StoreResult<Option<Machine>> {
        let mut machines = write(&self.machines, "machines");
        Ok(machines.get_mut(id).map(|machine| {
            machine.apply(&patch);
            machine.clone()
        }))
    }

    async fn list_by_type(&self, machine_type: MachineType) -> StoreResult<Vec<Machine>> {
        Ok(self.machines_where(|m| m.machine_type == machine_type))
    }

    async fn create(&self, draft: MachineDraft) -> StoreResult<Machine> {
        let machine = Machine::from_draft(new_id(), draft);
        write(&self.machines, "machines").insert(machine.id.clone(), machine.clone());
        Ok(machine)
    }

    async fn list_all(&self) -> StoreResult<Vec<Machine>> {
        Ok(self.machines_where(|_| true))
    }
}

#[async_trait]
impl ProjectStore for MemoryBackend {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(read(&self.projects, "projects").get(id).cloned())
    }

    async fn create(&self, draft: ProjectDraft) -> StoreResult<Project> {
        let project = Project::from_draft(new_id(), draft);
        write(&self.projects, "projects").insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn list_all(&self) -> StoreResult<Vec<Project>> {
        let projects = read(&self.projects, "projects");
        let mut result: Vec<Project> = projects.values().cloned().collect();
        result.sort_by(|a, b| a.deadline.cmp(&b.deadline).then(a.id.cmp(&b.id)));
        Ok(result)
    }
}

#[async_trait]
impl AlertStore for MemoryBackend {
    async fn create(&self, draft: AlertDraft) -> StoreResult<SystemAlert> {
        let alert = SystemAlert::from_draft(new_id(), draft, self.clock.now());
        write(&self.alerts, "alerts").push(alert.clone());
        Ok(alert)
    }

    async fn list_all(&self) -> StoreResult<Vec<SystemAlert>> {
        Ok(read(&self.alerts, "alerts").clone())
    }
}

#[async_trait]
impl MessageStore for MemoryBackend {
    async fn create(&self, draft: MessageDraft) -> StoreResult<SystemMessage> {
        let message = SystemMessage::from_draft(new_id(), draft, self.clock.now());
        write(&self.messages, "messages").push(message.clone());
        Ok(message)
    }

    async fn list_all(&self) -> StoreResult<Vec<SystemMessage>> {
        Ok(read(&self.messages, "messages").clone())
    }
}

#[async_trait]
impl EventStore for MemoryBackend {
    async fn create(&self, draft: EventDraft) -> StoreResult<ActivityEvent> {
        let event = ActivityEvent::from_draft(new_id(), draft, self.clock.now());
        write(&self.events, "events").push(event.clone());
        Ok(event)
    }

    async fn list_all(&self) -> StoreResult<Vec<ActivityEvent>> {
        Ok(read(&self.events, "events").clone())
    }
}
