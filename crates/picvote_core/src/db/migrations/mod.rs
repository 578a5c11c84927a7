//! Schema steps for the state store database.
//!
//! # Invariants
//! - Steps are listed in strictly increasing version order.
//! - All pending steps run in one transaction; `PRAGMA user_version` ends at
//!   the last applied step.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

/// `(version, sql)` pairs applied in order.
const STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Sqlite` when a step fails; the transaction is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = read_user_version(conn)?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<&(u32, &str)> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        run_step(&tx, *version, sql)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={found} to={latest}");
    Ok(())
}

fn run_step(tx: &Transaction<'_>, version: u32, sql: &str) -> DbResult<()> {
    tx.execute_batch(sql)?;
    tx.pragma_update(None, "user_version", version)?;
    Ok(())
}

fn read_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
