use recondesk_core::db::migrations::latest_version;
use recondesk_core::db::{open_db, open_db_in_memory, DbError};
use recondesk_core::repo::slot_repo::SlotKey;
use recondesk_core::{SlotRepository, SqliteSlotRepository, TenantId};
use rusqlite::Connection;

fn user_version(conn: &Connection) -> u32 {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap()
}

fn schema_objects(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT type || ':' || name FROM sqlite_master WHERE name LIKE '%storage_slots%' ORDER BY 1")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn fresh_memory_database_is_fully_migrated() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    let objects = schema_objects(&conn);
    assert!(objects.contains(&"table:storage_slots".to_string()));
    assert!(objects.contains(&"index:idx_storage_slots_updated_at".to_string()));
}

#[test]
fn slots_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.sqlite3");
    let metro = TenantId::parse("metro-motors").unwrap();

    {
        let conn = open_db(&path).unwrap();
        SqliteSlotRepository::new(&conn)
            .write_slot((&metro).into(), SlotKey::Contacts, r#"[{"id":1}]"#)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    let payload = SqliteSlotRepository::new(&conn)
        .read_slot((&metro).into(), SlotKey::Contacts)
        .unwrap();
    assert_eq!(payload.as_deref(), Some(r#"[{"id":1}]"#));
}

#[test]
fn file_written_by_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk.sqlite3");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", latest_version() + 1)
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(err, DbError::SchemaTooNew { found, supported }
            if found == latest_version() + 1 && supported == latest_version()),
        "got {err}"
    );
}

#[test]
fn open_db_creates_missing_directories_and_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("desk").join("recondesk.sqlite3");

    let conn = open_db(&path).unwrap();
    assert!(path.exists());
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
