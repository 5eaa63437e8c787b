//! Store interfaces the engine reads and mutates through.
//!
//! Each store owns one entity collection. Stores assign identities and
//! creation timestamps; callers hand in drafts without either. Backends are
//! interchangeable: [`MemoryBackend`] keeps everything in process,
//! [`SqliteBackend`] persists to a local database.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StoreError;
use crate::model::{
    ActivityEvent, AlertDraft, EventDraft, Job, JobDraft, JobPatch, Machine, MachineDraft,
    MachinePatch, MachineType, MessageDraft, Project, ProjectDraft, SystemAlert, SystemMessage,
};
use crate::Clock;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Job>>;
    /// Applies `patch`; returns the updated job, or `None` if `id` does not resolve.
    async fn update(&self, id: &str, patch: JobPatch) -> StoreResult<Option<Job>>;
    async fn create(&self, draft: JobDraft) -> StoreResult<Job>;
    async fn list_by_project(&self, project_id: &str) -> StoreResult<Vec<Job>>;
    async fn list_by_machine(&self, machine_id: &str) -> StoreResult<Vec<Job>>;
    async fn list_all(&self) -> StoreResult<Vec<Job>>;
}

#[async_trait]
pub trait MachineStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Machine>>;
    async fn update(&self, id: &str, patch: MachinePatch) -> StoreResult<Option<Machine>>;
    async fn list_by_type(&self, machine_type: MachineType) -> StoreResult<Vec<Machine>>;
    async fn create(&self, draft: MachineDraft) -> StoreResult<Machine>;
    async fn list_all(&self) -> StoreResult<Vec<Machine>>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Project>>;
    async fn create(&self, draft: ProjectDraft) -> StoreResult<Project>;
    async fn list_all(&self) -> StoreResult<Vec<Project>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create(&self, draft: AlertDraft) -> StoreResult<SystemAlert>;
    async fn list_all(&self) -> StoreResult<Vec<SystemAlert>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, draft: MessageDraft) -> StoreResult<SystemMessage>;
    async fn list_all(&self) -> StoreResult<Vec<SystemMessage>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create(&self, draft: EventDraft) -> StoreResult<ActivityEvent>;
    async fn list_all(&self) -> StoreResult<Vec<ActivityEvent>>;
}

/// Every store the engine needs, injected as trait objects.
///
/// Cloning is cheap (each field is an `Arc`).
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub machines: Arc<dyn MachineStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub messages: Arc<dyn MessageStore>,
    pub events: Arc<dyn EventStore>,
}

impl Stores {
    /// Uses one backend for every store.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: JobStore + MachineStore + ProjectStore + AlertStore + MessageStore + EventStore + 'static,
    {
        Self {
            jobs: backend.clone(),
            machines: backend.clone(),
            projects: backend.clone(),
            alerts: backend.clone(),
            messages: backend.clone(),
            events: backend,
        }
    }

    /// Opens the backend selected by `config`.
    pub fn open(config: &StorageConfig, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        match config.backend {
            StorageBackend::Memory => {
                log::info!("Using in-memory store backend");
                Ok(Self::from_backend(Arc::new(MemoryBackend::new(clock))))
            }
            StorageBackend::Sqlite => {
                let path = config.resolved_path().ok_or_else(|| {
                    crate::ConfigError::Validation {
                        message: "No database path configured and no home directory found"
                            .to_string(),
                    }
                })?;
                let db = crate::db::Database::open(&path)?;
                Ok(Self::from_backend(Arc::new(SqliteBackend::new(db, clock))))
            }
        }
    }
}
