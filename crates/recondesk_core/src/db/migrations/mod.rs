//! Forward-only schema steps for the slot store.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, sql)` in ascending version order. Never edit a shipped step;
/// append a new one.
const STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_storage_slots.sql")),
    (2, include_str!("0002_slot_updated_at_index.sql")),
];

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |&(version, _)| version)
}

/// Brings `conn` up to [`latest_version`] inside one transaction and returns
/// the resulting version.
pub fn migrate(conn: &mut Connection) -> DbResult<u32> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<_> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(found);
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_migrate module=db status=ok from={found} step={version}");
    }
    tx.commit()?;
    Ok(supported)
}
