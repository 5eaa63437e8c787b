//! Project repository: CRUD operations for the `projects` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};
use crate::model::{Project, ProjectStatus};

fn project_from_row(row: &Row<'_>) -> Result<Project, rusqlite::Error> {
    let id: String = row.get("id")?;
    let status: String = row.get("status")?;
    Ok(Project {
        status: ProjectStatus::parse(&status, &id),
        id,
        name: row.get("name")?,
        client: row.get("client")?,
        deadline: row.get("deadline")?,
    })
}

pub fn insert(db: &Database, project: &Project) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO projects (id, name, client, deadline, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                project.client,
                project.deadline,
                project.status.as_str(),
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<Project>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM projects WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], project_from_row)?;
        match rows.next() {
            Some(Ok(project)) => Ok(Some(project)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// All projects, earliest deadline first.
pub fn list(db: &Database) -> Result<Vec<Project>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM projects ORDER BY deadline ASC, id ASC")?;
        let rows = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_find_list() {
        let db = Database::open_in_memory().unwrap();
        let late = Project {
            id: "p1".to_string(),
            name: "Nave Norte".to_string(),
            client: Some("Agro SA".to_string()),
            deadline: "2024-06-10".to_string(),
            status: ProjectStatus::InProgress,
        };
        let early = Project {
            id: "p2".to_string(),
            name: "Galpón Sur".to_string(),
            client: None,
            deadline: "2024-05-01".to_string(),
            status: ProjectStatus::Planning,
        };
        insert(&db, &late).unwrap();
        insert(&db, &early).unwrap();

        assert_eq!(find_by_id(&db, "p1").unwrap(), Some(late));
        let all = list(&db).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "p2");
    }
}
