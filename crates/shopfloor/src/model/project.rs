//! Customer projects that group jobs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Completed,
    Delayed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "PLANNING",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Delayed => "DELAYED",
            ProjectStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str, project_id: &str) -> Self {
        match s {
            "PLANNING" => ProjectStatus::Planning,
            "IN_PROGRESS" => ProjectStatus::InProgress,
            "COMPLETED" => ProjectStatus::Completed,
            "DELAYED" => ProjectStatus::Delayed,
            "ARCHIVED" => ProjectStatus::Archived,
            other => {
                log::warn!(
                    "Unknown project status '{}' for project {}, defaulting to PLANNING",
                    other,
                    project_id
                );
                ProjectStatus::Planning
            }
        }
    }
}

/// A project owns jobs by foreign key (`Job::project_id`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Delivery date as `YYYY-MM-DD`. Compared as a plain string.
    pub deadline: String,
    pub status: ProjectStatus,
}

impl Project {
    pub fn from_draft(id: String, draft: ProjectDraft) -> Self {
        Self {
            id,
            name: draft.name,
            client: draft.client,
            deadline: draft.deadline,
            status: draft.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub client: Option<String>,
    pub deadline: String,
    pub status: ProjectStatus,
}

impl ProjectDraft {
    pub fn new(name: &str, deadline: &str) -> Self {
        Self {
            name: name.to_string(),
            client: None,
            deadline: deadline.to_string(),
            status: ProjectStatus::InProgress,
        }
    }
}
