//! Machine repository: CRUD operations for the `machines` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw machine row from the database.
#[derive(Debug, Clone)]
pub struct MachineRow {
    pub id: String,
    pub name: String,
    pub machine_type: String,
    pub status: String,
    /// JSON array of operator ids.
    pub operator_ids: String,
    pub current_job_id: Option<String>,
}

impl MachineRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            machine_type: row.get("machine_type")?,
            status: row.get("status")?,
            operator_ids: row.get("operator_ids")?,
            current_job_id: row.get("current_job_id")?,
        })
    }
}

pub fn insert(db: &Database, machine: &MachineRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO machines (id, name, machine_type, status, operator_ids, current_job_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                machine.id,
                machine.name,
                machine.machine_type,
                machine.status,
                machine.operator_ids,
                machine.current_job_id,
            ],
        )?;
        Ok(())
    })
}

/// Overwrites status, operators and the current-job pointer.
pub fn update(db: &Database, machine: &MachineRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE machines SET status=?2, operator_ids=?3, current_job_id=?4 WHERE id=?1",
            params![
                machine.id,
                machine.status,
                machine.operator_ids,
                machine.current_job_id,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<MachineRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM machines WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], MachineRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists machines, optionally restricted to one type, ordered by name.
pub fn list(db: &Database, machine_type: Option<&str>) -> Result<Vec<MachineRow>, DatabaseError> {
    db.with_conn(|conn| {
        let rows = match machine_type {
            Some(t) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM machines WHERE machine_type = ?1 ORDER BY name ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map(params![t], MachineRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare("SELECT * FROM machines ORDER BY name ASC, id ASC")?;
                let rows = stmt
                    .query_map([], MachineRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    })
}
