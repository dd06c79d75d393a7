//! Schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its bookkeeping row, so a
//! failure leaves the schema at the previous version.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::DatabaseError;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
    /// Column the SQL adds. When it is already present the SQL is skipped
    /// but the version is still recorded.
    adds_column: Option<(&'static str, &'static str)>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_analysis_cases_table",
        sql: include_str!("sql/001_create_analysis_cases.sql"),
        adds_column: None,
    },
    Migration {
        version: 2,
        name: "create_demo_cases_table",
        sql: include_str!("sql/002_create_demo_cases.sql"),
        adds_column: None,
    },
    Migration {
        version: 3,
        name: "add_article_sections_to_analysis_cases",
        sql: include_str!("sql/003_add_article_sections.sql"),
        adds_column: Some(("analysis_cases", "article_sections")),
    },
];

fn applied_versions(conn: &Connection) -> Result<HashSet<u32>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT version FROM _migrations")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, u32>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(versions)
}

pub(crate) fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let found = conn
        .query_row(
            "SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let failed = |e: rusqlite::Error| DatabaseError::Migration {
        version: migration.version,
        reason: e.to_string(),
    };

    let tx = conn.unchecked_transaction()?;
    let skip = match migration.adds_column {
        Some((table, column)) => has_column(&tx, table, column)?,
        None => false,
    };
    if skip {
        log::debug!(
            "Migration v{} skipped: column already present",
            migration.version
        );
    } else {
        tx.execute_batch(migration.sql).map_err(failed)?;
    }
    tx.execute(
        "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )?;
    tx.commit().map_err(failed)?;
    Ok(())
}

/// Brings the schema up to date.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied = applied_versions(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        log::info!("Applying migration v{} ({})", migration.version, migration.name);
        apply(conn, migration)?;
    }
    Ok(())
}
