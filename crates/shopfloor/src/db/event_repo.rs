//! Event repository: append-only audit trail in the `events` table.

use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::model::{ActivityEvent, EventKind};

fn event_from_row(row: &Row<'_>) -> Result<ActivityEvent, rusqlite::Error> {
    let kind: String = row.get("kind")?;
    let created_at: String = row.get("created_at")?;
    Ok(ActivityEvent {
        id: row.get("id")?,
        source: row.get("source")?,
        kind: EventKind::parse(&kind),
        description: row.get("description")?,
        user: row.get("user")?,
        created_at: parse_timestamp(&created_at),
    })
}

pub fn insert(db: &Database, event: &ActivityEvent) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO events (id, source, kind, description, user, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id,
                event.source,
                event.kind.as_str(),
                event.description,
                event.user,
                format_timestamp(event.created_at),
            ],
        )?;
        Ok(())
    })
}

pub fn list(db: &Database) -> Result<Vec<ActivityEvent>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM events ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
