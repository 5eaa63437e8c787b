//! Builders for test entities and configurations.

#![allow(dead_code)]

use shopfloor::config::{Config, StorageBackend};
use shopfloor::model::{JobDraft, JobStatus, MachineDraft, MachineStatus, MachineType};
use shopfloor::DedupMode;

/// Builder for `JobDraft` instances.
pub struct JobBuilder {
    draft: JobDraft,
}

impl JobBuilder {
    /// A pending forming job for `project_id` with a target of 10 m2.
    pub fn new(project_id: &str) -> Self {
        Self {
            draft: JobDraft::new(project_id, "Chapa", MachineType::Forming, 10.0, "m2"),
        }
    }

    pub fn product(mut self, name: &str) -> Self {
        self.draft.product_name = name.to_string();
        self
    }

    pub fn machine_type(mut self, machine_type: MachineType) -> Self {
        self.draft.machine_type = machine_type;
        self
    }

    pub fn assigned_to(mut self, machine_id: &str) -> Self {
        self.draft.assigned_machine_id = Some(machine_id.to_string());
        self
    }

    pub fn target(mut self, target: f64) -> Self {
        self.draft.target_quantity = target;
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.draft.status = status;
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.draft.priority_index = Some(priority);
        self
    }

    pub fn build(self) -> JobDraft {
        self.draft
    }
}

/// Builder for `MachineDraft` instances.
pub struct MachineBuilder {
    draft: MachineDraft,
}

impl MachineBuilder {
    pub fn new(name: &str, machine_type: MachineType) -> Self {
        Self {
            draft: MachineDraft::new(name, machine_type),
        }
    }

    pub fn forming(name: &str) -> Self {
        Self::new(name, MachineType::Forming)
    }

    pub fn panel(name: &str) -> Self {
        Self::new(name, MachineType::PanelAssembly)
    }

    pub fn dispatch(name: &str) -> Self {
        Self::new(name, MachineType::Dispatch)
    }

    pub fn operator(mut self, operator_id: &str) -> Self {
        self.draft.operator_ids.push(operator_id.to_string());
        self
    }

    pub fn status(mut self, status: MachineStatus) -> Self {
        self.draft.status = status;
        self
    }

    pub fn build(self) -> MachineDraft {
        self.draft
    }
}

/// Builder for `Config` instances.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.config.version = version.to_string();
        self
    }

    pub fn sqlite(mut self, path: &str) -> Self {
        self.config.storage.backend = StorageBackend::Sqlite;
        self.config.storage.path = Some(path.to_string());
        self
    }

    pub fn upstream(mut self, machine_type: MachineType) -> Self {
        self.config.sequencing.upstream_machine_type = machine_type;
        self
    }

    pub fn downstream(mut self, machine_type: MachineType) -> Self {
        self.config.sequencing.downstream_machine_type = machine_type;
        self
    }

    pub fn dedup(mut self, dedup: DedupMode) -> Self {
        self.config.dispatch.dedup = dedup;
        self
    }

    pub fn sender(mut self, sender: &str) -> Self {
        self.config.dispatch.sender = sender.to_string();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// The configuration as JSON, for loader tests.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.config).expect("Failed to serialize config")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
