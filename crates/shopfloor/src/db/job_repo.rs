//! Job repository: CRUD operations for the `jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub project_id: String,
    pub product_name: String,
    pub machine_type: String,
    pub assigned_machine_id: Option<String>,
    pub target_quantity: f64,
    pub completed_quantity: f64,
    pub unit: String,
    pub status: String,
    pub priority_index: Option<i64>,
    /// JSON array of operator ids.
    pub operator_ids: String,
    /// JSON array of workflow stages.
    pub workflow_stages: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            product_name: row.get("product_name")?,
            machine_type: row.get("machine_type")?,
            assigned_machine_id: row.get("assigned_machine_id")?,
            target_quantity: row.get("target_quantity")?,
            completed_quantity: row.get("completed_quantity")?,
            unit: row.get("unit")?,
            status: row.get("status")?,
            priority_index: row.get("priority_index")?,
            operator_ids: row.get("operator_ids")?,
            workflow_stages: row.get("workflow_stages")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Query filter for job listing. Unset fields do not constrain.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub project_id: Option<String>,
    pub assigned_machine_id: Option<String>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, project_id, product_name, machine_type, assigned_machine_id,
             target_quantity, completed_quantity, unit, status, priority_index, operator_ids,
             workflow_stages, notes, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                job.id,
                job.project_id,
                job.product_name,
                job.machine_type,
                job.assigned_machine_id,
                job.target_quantity,
                job.completed_quantity,
                job.unit,
                job.status,
                job.priority_index,
                job.operator_ids,
                job.workflow_stages,
                job.notes,
                job.created_at,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Updates an existing job row. All fields except `id`, `project_id` and
/// `created_at` are overwritten.
pub fn update(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET product_name=?2, machine_type=?3, assigned_machine_id=?4,
             target_quantity=?5, completed_quantity=?6, unit=?7, status=?8, priority_index=?9,
             operator_ids=?10, workflow_stages=?11, notes=?12, completed_at=?13
             WHERE id=?1",
            params![
                job.id,
                job.product_name,
                job.machine_type,
                job.assigned_machine_id,
                job.target_quantity,
                job.completed_quantity,
                job.unit,
                job.status,
                job.priority_index,
                job.operator_ids,
                job.workflow_stages,
                job.notes,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Queries jobs matching the filter, oldest first.
pub fn query(db: &Database, filter: &JobFilter) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref project_id) = filter.project_id {
            conditions.push(format!("project_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(project_id.clone()));
        }
        if let Some(ref machine_id) = filter.assigned_machine_id {
            conditions.push(format!("assigned_machine_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(machine_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at ASC, id ASC",
            where_clause
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_row(id: &str, project_id: &str, machine_id: Option<&str>) -> JobRow {
        JobRow {
            id: id.to_string(),
            project_id: project_id.to_string(),
            product_name: "Perfil C".to_string(),
            machine_type: "forming".to_string(),
            assigned_machine_id: machine_id.map(|m| m.to_string()),
            target_quantity: 120.0,
            completed_quantity: 0.0,
            unit: "m".to_string(),
            status: "PENDING".to_string(),
            priority_index: Some(1),
            operator_ids: "[]".to_string(),
            workflow_stages: "[]".to_string(),
            notes: None,
            created_at: format!("2024-05-01T08:00:0{}+00:00", id.len() % 10),
            completed_at: None,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_row("j1", "p1", Some("m1"))).unwrap();

        let row = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(row.project_id, "p1");
        assert_eq!(row.target_quantity, 120.0);
        assert_eq!(row.priority_index, Some(1));
        assert!(find_by_id(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_update_overwrites_fields() {
        let db = test_db();
        let mut row = sample_row("j1", "p1", Some("m1"));
        insert(&db, &row).unwrap();

        row.status = "COMPLETED".to_string();
        row.completed_quantity = 120.0;
        row.completed_at = Some("2024-05-01T10:00:00+00:00".to_string());
        row.notes = Some("ok".to_string());
        update(&db, &row).unwrap();

        let stored = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(stored.status, "COMPLETED");
        assert_eq!(stored.completed_quantity, 120.0);
        assert_eq!(stored.notes.as_deref(), Some("ok"));
        assert!(stored.completed_at.is_some());
    }

    #[test]
    fn test_query_filters() {
        let db = test_db();
        insert(&db, &sample_row("j1", "p1", Some("m1"))).unwrap();
        insert(&db, &sample_row("j22", "p1", Some("m2"))).unwrap();
        insert(&db, &sample_row("j333", "p2", Some("m1"))).unwrap();

        let by_project = query(
            &db,
            &JobFilter {
                project_id: Some("p1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_project.len(), 2);
        assert_eq!(by_project[0].id, "j1");

        let by_machine = query(
            &db,
            &JobFilter {
                assigned_machine_id: Some("m1".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_machine.len(), 2);

        assert_eq!(query(&db, &JobFilter::default()).unwrap().len(), 3);
    }
}
