//! Alert repository: append-only `alerts` table.

use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::model::{AlertSeverity, AlertType, SystemAlert};

fn alert_from_row(row: &Row<'_>) -> Result<Option<SystemAlert>, rusqlite::Error> {
    let id: String = row.get("id")?;
    let alert_type: String = row.get("alert_type")?;
    let Some(alert_type) = AlertType::parse(&alert_type) else {
        log::warn!("Skipping alert {} with unknown type '{}'", id, alert_type);
        return Ok(None);
    };
    let severity: String = row.get("severity")?;
    let created_at: String = row.get("created_at")?;
    Ok(Some(SystemAlert {
        id,
        alert_type,
        severity: AlertSeverity::parse(&severity),
        message: row.get("message")?,
        related_id: row.get("related_id")?,
        created_at: parse_timestamp(&created_at),
    }))
}

pub fn insert(db: &Database, alert: &SystemAlert) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO alerts (id, alert_type, severity, message, related_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                alert.id,
                alert.alert_type.as_str(),
                alert.severity.as_str(),
                alert.message,
                alert.related_id,
                format_timestamp(alert.created_at),
            ],
        )?;
        Ok(())
    })
}

/// All alerts, oldest first. Rows with an unknown type are skipped.
pub fn list(db: &Database) -> Result<Vec<SystemAlert>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM alerts ORDER BY created_at ASC, id ASC")?;
        let rows = stmt
            .query_map([], alert_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().flatten().collect())
    })
}
