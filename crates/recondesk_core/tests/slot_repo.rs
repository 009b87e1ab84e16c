use recondesk_core::db::open_db_in_memory;
use recondesk_core::repo::collection::{load_collection, save_collection};
use recondesk_core::repo::slot_repo::{SlotKey, SlotScope};
use recondesk_core::{RepoError, SlotRepository, SqliteSlotRepository, TenantId};

fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).unwrap()
}

#[test]
fn write_then_read_returns_latest_payload() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let metro = tenant("metro-motors");

    assert_eq!(repo.read_slot((&metro).into(), SlotKey::Todos).unwrap(), None);

    repo.write_slot((&metro).into(), SlotKey::Todos, "[1]").unwrap();
    repo.write_slot((&metro).into(), SlotKey::Todos, "[1,2]").unwrap();

    assert_eq!(
        repo.read_slot((&metro).into(), SlotKey::Todos).unwrap().as_deref(),
        Some("[1,2]")
    );
}

#[test]
fn slots_are_isolated_per_tenant_and_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let metro = tenant("metro-motors");
    let lakeside = tenant("lakeside");

    save_collection(&repo, (&metro).into(), SlotKey::Contacts, &["a", "b"]).unwrap();
    save_collection(&repo, (&lakeside).into(), SlotKey::Contacts, &["c"]).unwrap();

    let metro_contacts: Vec<String> =
        load_collection(&repo, (&metro).into(), SlotKey::Contacts).unwrap();
    let lakeside_todos: Vec<String> =
        load_collection(&repo, (&lakeside).into(), SlotKey::Todos).unwrap();
    assert_eq!(metro_contacts, vec!["a", "b"]);
    assert!(lakeside_todos.is_empty());
}

#[test]
fn list_tenants_skips_system_scope() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);

    repo.write_slot(SlotScope::System, SlotKey::Dealerships, "[]")
        .unwrap();
    repo.write_slot((&tenant("zeta")).into(), SlotKey::Todos, "[]")
        .unwrap();
    repo.write_slot((&tenant("alpha")).into(), SlotKey::Contacts, "[]")
        .unwrap();
    repo.write_slot((&tenant("alpha")).into(), SlotKey::Todos, "[]")
        .unwrap();

    assert_eq!(
        repo.list_tenants().unwrap(),
        vec![tenant("alpha"), tenant("zeta")]
    );
}

#[test]
fn remove_slot_reports_whether_anything_was_deleted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let metro = tenant("metro-motors");

    repo.write_slot((&metro).into(), SlotKey::Settings, "{}")
        .unwrap();
    assert!(repo.remove_slot((&metro).into(), SlotKey::Settings).unwrap());
    assert!(!repo.remove_slot((&metro).into(), SlotKey::Settings).unwrap());
}

#[test]
fn malformed_payload_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let metro = tenant("metro-motors");

    repo.write_slot((&metro).into(), SlotKey::Contacts, "{not json")
        .unwrap();

    let loaded: Result<Vec<String>, RepoError> =
        load_collection(&repo, (&metro).into(), SlotKey::Contacts);
    match loaded.unwrap_err() {
        RepoError::InvalidData { scope, key, .. } => {
            assert_eq!(scope, "metro-motors");
            assert_eq!(key, "contacts");
        }
        other => panic!("unexpected error: {other}"),
    }
}
