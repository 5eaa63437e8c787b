//! Versioned schema for the shop database.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its bookkeeping row, so a
//! failure leaves neither half-applied DDL nor a recorded version behind.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    Standard,
    /// `ALTER TABLE .. ADD COLUMN`. Skipped when the column is already
    /// there, since SQLite has no `ADD COLUMN IF NOT EXISTS`.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_projects_table",
        sql: include_str!("sql/001_create_projects.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_machines_table",
        sql: include_str!("sql/002_create_machines.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_jobs_table",
        sql: include_str!("sql/003_create_jobs.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "create_alerts_table",
        sql: include_str!("sql/004_create_alerts.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 5,
        description: "create_messages_table",
        sql: include_str!("sql/005_create_messages.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 6,
        description: "create_events_table",
        sql: include_str!("sql/006_create_events.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 7,
        description: "add_project_id_to_messages",
        sql: include_str!("sql/007_add_message_project_id.sql"),
        kind: MigrationKind::AddColumn {
            table: "messages",
            column: "project_id",
        },
    },
    Migration {
        version: 8,
        description: "add_delivery_date_to_messages",
        sql: include_str!("sql/008_add_message_delivery_date.sql"),
        kind: MigrationKind::AddColumn {
            table: "messages",
            column: "delivery_date",
        },
    },
    Migration {
        version: 9,
        description: "create_message_dedup_index",
        sql: include_str!("sql/009_create_message_dedup_index.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 10,
        description: "add_broadcast_to_messages",
        sql: include_str!("sql/010_add_message_broadcast.sql"),
        kind: MigrationKind::AddColumn {
            table: "messages",
            column: "broadcast",
        },
    },
    Migration {
        version: 11,
        description: "backfill_message_broadcast",
        sql: include_str!("sql/011_backfill_message_broadcast.sql"),
        kind: MigrationKind::Standard,
    },
];

/// Brings the schema up to date. Returns how many migrations were recorded.
pub fn run_all(conn: &Connection) -> Result<usize, DatabaseError> {
    apply(conn, MIGRATIONS)
}

fn apply(conn: &Connection, migrations: &[Migration]) -> Result<usize, DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    let mut applied = 0;
    for migration in migrations.iter().filter(|m| m.version > current) {
        let skip = match migration.kind {
            MigrationKind::Standard => false,
            MigrationKind::AddColumn { table, column } => column_exists(conn, table, column)?,
        };

        let failed = |source| DatabaseError::Migration {
            version: migration.version,
            description: migration.description,
            source,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        if skip {
            log::info!(
                "Migration v{} ({}): column already present, recording only",
                migration.version,
                migration.description
            );
        } else {
            log::info!(
                "Applying migration v{} ({})",
                migration.version,
                migration.description
            );
            tx.execute_batch(migration.sql).map_err(failed)?;
        }
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;
        applied += 1;
    }

    Ok(applied)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    // The name is interpolated into the PRAGMA, so keep it to identifier characters.
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::InvalidTableName {
            table: table.to_string(),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|name| name.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        conn
    }

    fn recorded(conn: &Connection) -> u32 {
        conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap()
    }

    fn index_exists(conn: &Connection, name: &str) -> bool {
        let count: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                [name],
                |r| r.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_fresh_database_gets_every_migration() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(run_all(&conn).unwrap(), MIGRATIONS.len());
        assert_eq!(recorded(&conn), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_second_run_applies_nothing() {
        let conn = migrated();
        assert_eq!(run_all(&conn).unwrap(), 0);
        assert_eq!(recorded(&conn), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_messages_table_has_dedup_columns_and_index() {
        let conn = migrated();
        assert!(column_exists(&conn, "messages", "project_id").unwrap());
        assert!(column_exists(&conn, "messages", "delivery_date").unwrap());
        assert!(column_exists(&conn, "messages", "broadcast").unwrap());
        assert!(index_exists(&conn, "idx_messages_dedup"));
    }

    #[test]
    fn test_dedup_index_created_when_columns_predate_migrations() {
        let conn = Connection::open_in_memory().unwrap();
        // A database that gained both key columns out of band.
        conn.execute_batch(include_str!("sql/005_create_messages.sql"))
            .unwrap();
        conn.execute_batch(
            "ALTER TABLE messages ADD COLUMN project_id TEXT;
             ALTER TABLE messages ADD COLUMN delivery_date TEXT;",
        )
        .unwrap();

        run_all(&conn).unwrap();
        assert!(index_exists(&conn, "idx_messages_dedup"));
    }

    #[test]
    fn test_legacy_broadcast_rows_are_flagged() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn, &MIGRATIONS[..9]).unwrap();
        conn.execute_batch(
            "INSERT INTO messages (id, sender, recipient, content, created_at)
             VALUES ('m1', 'SISTEMA', 'ALL', 'Parada general', '2024-05-01T08:00:00+00:00'),
                    ('m2', 'SISTEMA', 'op-1', 'Carga P2', '2024-05-01T08:00:00+00:00');",
        )
        .unwrap();

        run_all(&conn).unwrap();
        let flags: Vec<(String, bool)> = conn
            .prepare("SELECT id, broadcast FROM messages ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, bool>(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            flags,
            vec![("m1".to_string(), true), ("m2".to_string(), false)]
        );
    }

    #[test]
    fn test_failed_migration_is_not_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        let broken = [
            Migration {
                version: 1,
                description: "create_projects_table",
                sql: include_str!("sql/001_create_projects.sql"),
                kind: MigrationKind::Standard,
            },
            Migration {
                version: 2,
                description: "broken_statement",
                sql: "CREATE TABLE half (id TEXT); INSERT INTO missing_table VALUES (1);",
                kind: MigrationKind::Standard,
            },
        ];

        let err = apply(&conn, &broken).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Migration {
                version: 2,
                description: "broken_statement",
                ..
            }
        ));
        assert_eq!(recorded(&conn), 1);
        // The partial DDL was rolled back with the transaction.
        let half: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'half'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(half, 0);
    }

    #[test]
    fn test_column_exists_rejects_odd_table_names() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
        assert!(matches!(
            column_exists(&conn, "bad;name", "id"),
            Err(DatabaseError::InvalidTableName { .. })
        ));
    }
}
