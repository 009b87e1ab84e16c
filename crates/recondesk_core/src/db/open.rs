use super::migrations::migrate;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) the slot database at `path` and applies all
/// pending migrations.
///
/// # Side effects
/// - Creates missing parent directories.
/// - Switches the file to WAL mode.
/// - Emits `db_open` logging events: `status=start`, then `status=ok` or
///   `status=error` with duration.
///
/// # Errors
/// - `DbError::Io` when a parent directory cannot be created.
/// - `DbError::SchemaTooNew` when the file was written by a newer build.
/// - `DbError::Sqlite` for any other SQLite failure.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let target = path.display().to_string();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file target={target}");

    let result = create_parent(path).and_then(|()| {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        prepare(conn)
    });
    log_open("file", &target, started_at, &result);
    result
}

/// Opens a private in-memory database and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(prepare);
    log_open("memory", ":memory:", started_at, &result);
    result
}

fn create_parent(path: &Path) -> DbResult<()> {
    match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| DbError::Io {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

fn prepare(mut conn: Connection) -> DbResult<Connection> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let version = migrate(&mut conn)?;
    info!("event=db_schema module=db status=ok schema_version={version}");
    Ok(conn)
}

fn log_open(mode: &str, target: &str, started_at: Instant, result: &DbResult<Connection>) {
    let elapsed_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={mode} target={target} duration_ms={elapsed_ms}"
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} target={target} duration_ms={elapsed_ms} error={err}"
        ),
    }
}
