use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "schema_version",
        sql: include_str!("migrations/002_schema_version.sql"),
    },
];

/// Bring the table layout up to date.
///
/// Only the table layout is versioned here. Snapshot payloads already stored
/// in the rows are never rewritten; the restorer reads every historical shape.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    if is_untracked_database(conn)? {
        mark_migration_applied(conn, "001", "initial")?;
        tracing::info!("Found sessions table without migration history, baselined at 001");
    }

    let applied = get_applied_migrations(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|m| !applied.iter().any(|v| v == m.version))
        .collect();
    if pending.is_empty() {
        tracing::debug!("Database schema is current");
    }
    for migration in pending {
        apply_migration(conn, migration)?;
    }

    Ok(())
}

/// A database created before migrations were tracked: the sessions table is
/// there but nothing is recorded.
fn is_untracked_database(conn: &Connection) -> Result<bool> {
    let recorded: i64 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))?;
    if recorded > 0 {
        return Ok(false);
    }

    let sessions_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='teaching_sessions'",
        [],
        |row| row.get(0),
    )?;
    Ok(sessions_table > 0)
}

fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(versions)
}

fn mark_migration_applied(conn: &Connection, version: &str, name: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (version, name, &now),
    )?;
    Ok(())
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {}: {}",
        migration.version,
        migration.name
    );

    conn.execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", migration.sql))
        .with_context(|| {
            format!(
                "Failed to apply migration {}: {}",
                migration.version, migration.name
            )
        })?;

    mark_migration_applied(conn, migration.version, migration.name)?;

    tracing::info!("Migration {} applied successfully", migration.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM pragma_table_info('teaching_sessions')")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let columns = column_names(&conn);
        assert!(columns.contains(&"act3_socratic".to_string()));
        assert!(columns.contains(&"schema_version".to_string()));
        assert!(columns.contains(&"act4_full_report".to_string()));

        let versions = get_applied_migrations(&conn).unwrap();
        assert_eq!(versions, vec!["001", "002"]);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let versions = get_applied_migrations(&conn).unwrap();
        assert_eq!(versions, vec!["001", "002"]);
    }

    #[test]
    fn test_existing_db_gets_baseline() {
        let conn = Connection::open_in_memory().unwrap();

        // A database created before migration tracking, with the 001 layout
        conn.execute_batch(include_str!("migrations/001_initial.sql"))
            .unwrap();
        conn.execute(
            "INSERT INTO teaching_sessions (id, version, case_title, created_at, updated_at, last_saved_at)
             VALUES ('s1', '1.0.0', 'Old case', 'x', 'x', 'x')",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let versions = get_applied_migrations(&conn).unwrap();
        assert_eq!(versions, vec!["001", "002"]);
        let schema_version: Option<i64> = conn
            .query_row(
                "SELECT schema_version FROM teaching_sessions WHERE id = 's1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(schema_version, None);
    }
}
