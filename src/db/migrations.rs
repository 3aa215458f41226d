use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Schema files in order; entry `i` migrates the database to version `i + 1`.
const SCHEMAS: [(&str, &str); 1] = [("schema_v1.sql", include_str!("schemas/schema_v1.sql"))];

const TARGET_VERSION: i64 = SCHEMAS.len() as i64;

/// Brings the database up to the current schema, tracked via `user_version`.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")?;

    if version > TARGET_VERSION {
        bail!("database schema version {version} is newer than this build supports ({TARGET_VERSION})");
    }
    if version == TARGET_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to begin migration transaction")?;
    for (name, sql) in &SCHEMAS[version as usize..] {
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply {name}"))?;
    }
    tx.pragma_update(None, "user_version", TARGET_VERSION)
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit migrations")?;

    log::info!("migrated database schema from version {version} to {TARGET_VERSION}");
    Ok(())
}
