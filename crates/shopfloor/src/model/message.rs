//! Operator-facing messages. Also the ledger for dispatch de-duplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text shown in the recipient column of a message addressed to everyone.
/// Operators may use the same id, so it never decides the recipient alone.
pub const BROADCAST_RECIPIENT: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Recipient {
    Operator(String),
    Broadcast,
}

impl Recipient {
    pub fn as_wire(&self) -> &str {
        match self {
            Recipient::Operator(id) => id,
            Recipient::Broadcast => BROADCAST_RECIPIENT,
        }
    }

    /// Rebuilds a recipient from its stored text and broadcast flag.
    pub fn from_stored(recipient: &str, broadcast: bool) -> Self {
        if broadcast {
            Recipient::Broadcast
        } else {
            Recipient::Operator(recipient.to_string())
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Recipient::Broadcast)
    }

    pub fn is_operator(&self, operator_id: &str) -> bool {
        matches!(self, Recipient::Operator(id) if id == operator_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub id: String,
    /// Who sent it (a fixed tag for system-generated messages).
    pub sender: String,
    pub recipient: Recipient,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// Project the message is about, when it was generated for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Delivery date (`YYYY-MM-DD`) the message refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
}

impl SystemMessage {
    pub fn from_draft(id: String, draft: MessageDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: draft.sender,
            recipient: draft.recipient,
            content: draft.content,
            created_at,
            read: draft.read,
            project_id: draft.project_id,
            delivery_date: draft.delivery_date,
        }
    }

    /// Calendar day (UTC) the message was created on, as `YYYY-MM-DD`.
    pub fn created_on(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub sender: String,
    pub recipient: Recipient,
    pub content: String,
    pub read: bool,
    pub project_id: Option<String>,
    pub delivery_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_stored_form() {
        assert_eq!(Recipient::from_stored("ALL", true), Recipient::Broadcast);
        assert_eq!(
            Recipient::from_stored("op-7", false),
            Recipient::Operator("op-7".to_string())
        );
        assert_eq!(Recipient::Operator("op-7".to_string()).as_wire(), "op-7");
        assert!(!Recipient::Broadcast.is_operator("ALL"));
    }

    #[test]
    fn test_operator_named_all_is_not_broadcast() {
        let operator = Recipient::from_stored("ALL", false);
        assert_eq!(operator, Recipient::Operator("ALL".to_string()));
        assert!(operator.is_operator("ALL"));
        assert!(!operator.is_broadcast());
    }
}
