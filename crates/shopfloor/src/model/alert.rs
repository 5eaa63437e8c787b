//! Dashboard alerts. Written once, never mutated by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    ReadyForDelivery,
    MachineError,
    Delay,
    LowStock,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ReadyForDelivery => "READY_FOR_DELIVERY",
            AlertType::MachineError => "MACHINE_ERROR",
            AlertType::Delay => "DELAY",
            AlertType::LowStock => "LOW_STOCK",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "READY_FOR_DELIVERY" => Some(AlertType::ReadyForDelivery),
            "MACHINE_ERROR" => Some(AlertType::MachineError),
            "DELAY" => Some(AlertType::Delay),
            "LOW_STOCK" => Some(AlertType::LowStock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    High,
    Medium,
    Low,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::High => "HIGH",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::Low => "LOW",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "HIGH" => AlertSeverity::High,
            "MEDIUM" => AlertSeverity::Medium,
            _ => AlertSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlert {
    pub id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    /// Entity the alert is about (a project id for delivery alerts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SystemAlert {
    pub fn from_draft(id: String, draft: AlertDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            alert_type: draft.alert_type,
            severity: draft.severity,
            message: draft.message,
            related_id: draft.related_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub related_id: Option<String>,
}

impl AlertDraft {
    /// HIGH-severity alert announcing that every job of a project is done.
    pub fn ready_for_delivery(project_id: &str, project_name: &str) -> Self {
        Self {
            alert_type: AlertType::ReadyForDelivery,
            severity: AlertSeverity::High,
            message: format!(
                "Project {} is complete and ready for delivery",
                project_name
            ),
            related_id: Some(project_id.to_string()),
        }
    }
}
