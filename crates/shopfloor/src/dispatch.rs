//! Same-day dispatch notices for projects that just became ready.
//!
//! Every operator on the loading/dispatch machine gets at most one notice per
//! project per calendar day. The message store doubles as the ledger of what
//! was already sent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DispatchConfig;
use crate::model::{MachineType, MessageDraft, Project, Recipient, SystemMessage};
use crate::store::{MachineStore, MessageStore, StoreResult};
use crate::Clock;

/// How an earlier notice is recognised.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DedupMode {
    /// Message content contains the project name.
    #[serde(rename = "content")]
    ContentSubstring,
    /// Message carries the `(project_id, delivery_date)` key. Messages without
    /// the key fall back to the content rule.
    #[default]
    #[serde(rename = "structured")]
    Structured,
}

/// Why no notice went out.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchSkip {
    NotDueToday,
    NoDispatchMachine,
    NoOperators,
    AlreadyNotified,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub notified: bool,
    /// Operators that received a notice in this call.
    pub operators: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<DispatchSkip>,
}

impl DispatchOutcome {
    fn skipped(reason: DispatchSkip) -> Self {
        Self {
            notified: false,
            operators: Vec::new(),
            skipped: Some(reason),
        }
    }
}

/// True iff the project is due today. Exact string match on `YYYY-MM-DD`;
/// overdue projects are never notified.
pub fn should_notify_dispatch(project: &Project, today: &str) -> bool {
    project.deadline == today
}

/// True iff `operator_id` already got a message today whose content
/// mentions `project_name`.
pub fn has_already_notified(
    messages: &[SystemMessage],
    project_name: &str,
    operator_id: &str,
    today: &str,
) -> bool {
    messages.iter().any(|m| {
        m.recipient.is_operator(operator_id)
            && m.content.contains(project_name)
            && m.created_on() == today
    })
}

/// Like [`has_already_notified`], but keyed on `(project_id, operator, date)`
/// for messages that carry the key.
pub fn has_already_notified_for_project(
    messages: &[SystemMessage],
    project: &Project,
    operator_id: &str,
    today: &str,
) -> bool {
    messages.iter().any(|m| {
        if !m.recipient.is_operator(operator_id) {
            return false;
        }
        match (&m.project_id, &m.delivery_date) {
            (Some(project_id), Some(date)) => *project_id == project.id && date == today,
            _ => m.content.contains(&project.name) && m.created_on() == today,
        }
    })
}

/// Notice text for one operator. Always contains the project name.
pub fn dispatch_message_content(project: &Project) -> String {
    format!(
        "Project {} is finished and due for delivery today. Prepare the load for dispatch.",
        project.name
    )
}

/// Sends dispatch notices through the machine and message stores.
pub struct DispatchNotifier {
    machines: Arc<dyn MachineStore>,
    messages: Arc<dyn MessageStore>,
    clock: Arc<dyn Clock>,
    dispatch_type: MachineType,
    config: DispatchConfig,
}

impl DispatchNotifier {
    pub fn new(
        machines: Arc<dyn MachineStore>,
        messages: Arc<dyn MessageStore>,
        clock: Arc<dyn Clock>,
        dispatch_type: MachineType,
        config: DispatchConfig,
    ) -> Self {
        Self {
            machines,
            messages,
            clock,
            dispatch_type,
            config,
        }
    }

    fn already_notified(
        &self,
        ledger: &[SystemMessage],
        project: &Project,
        operator_id: &str,
        today: &str,
    ) -> bool {
        match self.config.dedup {
            DedupMode::ContentSubstring => {
                has_already_notified(ledger, &project.name, operator_id, today)
            }
            DedupMode::Structured => {
                has_already_notified_for_project(ledger, project, operator_id, today)
            }
        }
    }

    /// Notifies every operator of the dispatch machine that `project` ships today.
    pub async fn notify_dispatch_team(&self, project: &Project) -> StoreResult<DispatchOutcome> {
        let today = self.clock.today();

        if !should_notify_dispatch(project, &today) {
            log::debug!(
                "Project {} due {} (today {}), no dispatch notice",
                project.id,
                project.deadline,
                today
            );
            return Ok(DispatchOutcome::skipped(DispatchSkip::NotDueToday));
        }

        let Some(machine) = self
            .machines
            .list_by_type(self.dispatch_type)
            .await?
            .into_iter()
            .next()
        else {
            log::warn!(
                "No {} machine configured, cannot notify dispatch for project {}",
                self.dispatch_type,
                project.id
            );
            return Ok(DispatchOutcome::skipped(DispatchSkip::NoDispatchMachine));
        };

        if machine.operator_ids.is_empty() {
            log::warn!(
                "Dispatch machine {} has no operators assigned, project {} not notified",
                machine.id,
                project.id
            );
            return Ok(DispatchOutcome::skipped(DispatchSkip::NoOperators));
        }

        // Messages sent below join the ledger, so an operator listed twice
        // on the machine is still notified once.
        let mut ledger = self.messages.list_all().await?;
        let mut notified = Vec::new();

        for operator_id in &machine.operator_ids {
            if self.already_notified(&ledger, project, operator_id, &today) {
                log::debug!(
                    "Operator {} already notified about project {} today",
                    operator_id,
                    project.id
                );
                continue;
            }

            let sent = self
                .messages
                .create(MessageDraft {
                    sender: self.config.sender.clone(),
                    recipient: Recipient::Operator(operator_id.clone()),
                    content: dispatch_message_content(project),
                    read: false,
                    project_id: Some(project.id.clone()),
                    delivery_date: Some(today.clone()),
                })
                .await?;
            ledger.push(sent);
            notified.push(operator_id.clone());
        }

        if notified.is_empty() {
            return Ok(DispatchOutcome::skipped(DispatchSkip::AlreadyNotified));
        }

        log::info!(
            "Dispatch notified for project {}: {} operator(s)",
            project.id,
            notified.len()
        );

        Ok(DispatchOutcome {
            notified: true,
            operators: notified,
            skipped: None,
        })
    }
}
