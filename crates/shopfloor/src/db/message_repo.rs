//! Message repository: CRUD operations for the `messages` table.

use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::model::{Recipient, SystemMessage};

fn message_from_row(row: &Row<'_>) -> Result<SystemMessage, rusqlite::Error> {
    let recipient: String = row.get("recipient")?;
    let created_at: String = row.get("created_at")?;
    Ok(SystemMessage {
        id: row.get("id")?,
        sender: row.get("sender")?,
        recipient: Recipient::from_stored(&recipient, row.get("broadcast")?),
        content: row.get("content")?,
        created_at: parse_timestamp(&created_at),
        read: row.get("read")?,
        project_id: row.get("project_id")?,
        delivery_date: row.get("delivery_date")?,
    })
}

pub fn insert(db: &Database, message: &SystemMessage) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO messages (id, sender, recipient, content, created_at, read,
             project_id, delivery_date, broadcast)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                message.id,
                message.sender,
                message.recipient.as_wire(),
                message.content,
                format_timestamp(message.created_at),
                message.read,
                message.project_id,
                message.delivery_date,
                message.recipient.is_broadcast(),
            ],
        )?;
        Ok(())
    })
}

/// All messages, oldest first.
pub fn list(db: &Database) -> Result<Vec<SystemMessage>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM messages ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], message_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
