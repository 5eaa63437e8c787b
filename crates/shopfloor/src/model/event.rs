//! Audit trail entries. Fire-and-forget from the core's point of view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag used for events that are not bound to a machine.
pub const WORKSHOP_TAG: &str = "workshop";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Warning,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "warning" => EventKind::Warning,
            "error" => EventKind::Error,
            _ => EventKind::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: String,
    /// Machine id, or [`WORKSHOP_TAG`].
    pub source: String,
    pub kind: EventKind,
    pub description: String,
    /// Acting user.
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn from_draft(id: String, draft: EventDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            source: draft.source,
            kind: draft.kind,
            description: draft.description,
            user: draft.user,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub source: String,
    pub kind: EventKind,
    pub description: String,
    pub user: String,
}

impl EventDraft {
    pub fn info(source: Option<&str>, description: String, user: &str) -> Self {
        Self {
            source: source.unwrap_or(WORKSHOP_TAG).to_string(),
            kind: EventKind::Info,
            description,
            user: user.to_string(),
        }
    }
}
