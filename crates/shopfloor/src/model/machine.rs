//! Machines on the shop floor.

use serde::{Deserialize, Serialize};

/// Fixed classification of machines (and of the jobs that run on them).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    /// Roll-forming line (conformadora).
    Forming,
    /// Panel assembly line (panelizado).
    PanelAssembly,
    Welding,
    Paint,
    Metalwork,
    Cutting,
    /// Loading bay that dispatches finished projects.
    Dispatch,
    Other,
}

impl MachineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::Forming => "forming",
            MachineType::PanelAssembly => "panel_assembly",
            MachineType::Welding => "welding",
            MachineType::Paint => "paint",
            MachineType::Metalwork => "metalwork",
            MachineType::Cutting => "cutting",
            MachineType::Dispatch => "dispatch",
            MachineType::Other => "other",
        }
    }

    /// Parses a wire string, defaulting to `Other` for unknown values.
    pub fn parse(s: &str) -> Self {
        match s {
            "forming" => MachineType::Forming,
            "panel_assembly" => MachineType::PanelAssembly,
            "welding" => MachineType::Welding,
            "paint" => MachineType::Paint,
            "metalwork" => MachineType::Metalwork,
            "cutting" => MachineType::Cutting,
            "dispatch" => MachineType::Dispatch,
            "other" => MachineType::Other,
            unknown => {
                log::warn!("Unknown machine type '{}', defaulting to other", unknown);
                MachineType::Other
            }
        }
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineType::Forming => write!(f, "Forming"),
            MachineType::PanelAssembly => write!(f, "Panel assembly"),
            MachineType::Welding => write!(f, "Welding"),
            MachineType::Paint => write!(f, "Paint"),
            MachineType::Metalwork => write!(f, "Metalwork"),
            MachineType::Cutting => write!(f, "Cutting"),
            MachineType::Dispatch => write!(f, "Loading/dispatch"),
            MachineType::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    Running,
    Idle,
    Maintenance,
    Error,
    Offline,
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Running => "RUNNING",
            MachineStatus::Idle => "IDLE",
            MachineStatus::Maintenance => "MAINTENANCE",
            MachineStatus::Error => "ERROR",
            MachineStatus::Offline => "OFFLINE",
        }
    }

    pub fn parse(s: &str, machine_id: &str) -> Self {
        match s {
            "RUNNING" => MachineStatus::Running,
            "IDLE" => MachineStatus::Idle,
            "MAINTENANCE" => MachineStatus::Maintenance,
            "ERROR" => MachineStatus::Error,
            "OFFLINE" => MachineStatus::Offline,
            other => {
                log::warn!(
                    "Unknown machine status '{}' for machine {}, defaulting to OFFLINE",
                    other,
                    machine_id
                );
                MachineStatus::Offline
            }
        }
    }
}

/// A machine and what it is currently doing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub machine_type: MachineType,
    pub status: MachineStatus,
    #[serde(default)]
    pub operator_ids: Vec<String>,
    /// The one job this machine is running. Owned exclusively by the machine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_job_id: Option<String>,
}

impl Machine {
    pub fn from_draft(id: String, draft: MachineDraft) -> Self {
        Self {
            id,
            name: draft.name,
            machine_type: draft.machine_type,
            status: draft.status,
            operator_ids: draft.operator_ids,
            current_job_id: None,
        }
    }

    pub fn apply(&mut self, patch: &MachinePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ref current) = patch.current_job_id {
            self.current_job_id = current.clone();
        }
        if let Some(ref operators) = patch.operator_ids {
            self.operator_ids = operators.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MachineDraft {
    pub name: String,
    pub machine_type: MachineType,
    pub status: MachineStatus,
    pub operator_ids: Vec<String>,
}

impl MachineDraft {
    pub fn new(name: &str, machine_type: MachineType) -> Self {
        Self {
            name: name.to_string(),
            machine_type,
            status: MachineStatus::Idle,
            operator_ids: Vec::new(),
        }
    }
}

/// Partial update for a machine. `current_job_id: Some(None)` clears the pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachinePatch {
    pub status: Option<MachineStatus>,
    pub current_job_id: Option<Option<String>>,
    pub operator_ids: Option<Vec<String>>,
}

impl MachinePatch {
    /// Frees the machine: no current job, status IDLE.
    pub fn release() -> Self {
        Self {
            status: Some(MachineStatus::Idle),
            current_job_id: Some(None),
            operator_ids: None,
        }
    }

    /// Puts the machine to work on `job_id`.
    pub fn run(job_id: &str) -> Self {
        Self {
            status: Some(MachineStatus::Running),
            current_job_id: Some(Some(job_id.to_string())),
            operator_ids: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_type_round_trip_and_fallback() {
        assert_eq!(
            MachineType::parse(MachineType::PanelAssembly.as_str()),
            MachineType::PanelAssembly
        );
        assert_eq!(MachineType::parse("laser"), MachineType::Other);
    }

    #[test]
    fn test_machine_type_serde_is_snake_case() {
        let json = serde_json::to_string(&MachineType::PanelAssembly).unwrap();
        assert_eq!(json, "\"panel_assembly\"");
    }

    #[test]
    fn test_release_clears_current_job() {
        let mut machine = Machine::from_draft(
            "m1".to_string(),
            MachineDraft::new("CF-1", MachineType::Forming),
        );
        machine.apply(&MachinePatch::run("j1"));
        assert_eq!(machine.status, MachineStatus::Running);
        assert_eq!(machine.current_job_id.as_deref(), Some("j1"));

        machine.apply(&MachinePatch::release());
        assert_eq!(machine.status, MachineStatus::Idle);
        assert!(machine.current_job_id.is_none());
    }

    #[test]
    fn test_unknown_status_defaults_to_offline() {
        assert_eq!(MachineStatus::parse("ON_FIRE", "m1"), MachineStatus::Offline);
    }
}
