use anyhow::{Context, Result};
use rusqlite::Connection;

/// Bumped whenever `schema.sql` changes shape. Stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = include_str!("schema.sql");

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read schema version")
}

/// Create the key/value table on a fresh database. Databases already at
/// [`SCHEMA_VERSION`] are left alone.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!("Upgrading schema from version {} to {}", version, SCHEMA_VERSION);
    conn.execute_batch(&format!(
        "BEGIN TRANSACTION; {} PRAGMA user_version = {}; COMMIT;",
        SCHEMA, SCHEMA_VERSION
    ))
    .with_context(|| format!("Failed to create schema version {}", SCHEMA_VERSION))?;

    Ok(())
}
