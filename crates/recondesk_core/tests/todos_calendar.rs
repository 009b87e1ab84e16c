use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use recondesk_core::db::open_db_in_memory;
use recondesk_core::model::todo::{TodoValidationError, VehicleLink};
use recondesk_core::service::todo_service::{TodoQuery, TodoSort};
use recondesk_core::{
    CalendarService, FixedClock, SqliteSlotRepository, TenantId, TodoCategory, TodoDraft,
    TodoPriority, TodoService, TodoServiceError, TodoStatus,
};
use uuid::Uuid;

fn tenant() -> TenantId {
    TenantId::parse("metro-motors").unwrap()
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap() + Duration::days(offset)
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// 2026-03-14 10:00 local.
fn ten_am() -> NaiveDateTime {
    day(0).and_time(at(10, 0))
}

fn draft(title: &str, due_date: Option<NaiveDate>, due_time: Option<NaiveTime>) -> TodoDraft {
    TodoDraft {
        title: title.to_string(),
        assigned_to: "JD".to_string(),
        assigned_by: "MK".to_string(),
        due_date,
        due_time,
        ..TodoDraft::default()
    }
}

#[test]
fn overdue_respects_date_and_minute_boundaries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::with_clock(&repo, FixedClock::new(ten_am()));
    let tenant = tenant();

    let nine_today = service
        .create_todo(&tenant, draft("Oil change", Some(day(0)), Some(at(9, 0))))
        .unwrap();
    let ten_today = service
        .create_todo(&tenant, draft("Wheel align", Some(day(0)), Some(at(10, 0))))
        .unwrap();
    let today_no_time = service
        .create_todo(&tenant, draft("Detail", Some(day(0)), None))
        .unwrap();
    let tomorrow = service
        .create_todo(&tenant, draft("Photos", Some(day(1)), Some(at(8, 0))))
        .unwrap();
    let yesterday = service
        .create_todo(&tenant, draft("Title work", Some(day(-1)), None))
        .unwrap();
    let undated = service.create_todo(&tenant, draft("Someday", None, None)).unwrap();

    assert!(service.is_overdue(&nine_today));
    assert!(!service.is_overdue(&ten_today));
    assert!(!service.is_overdue(&today_no_time));
    assert!(!service.is_overdue(&tomorrow));
    assert!(service.is_overdue(&yesterday));
    assert!(!service.is_overdue(&undated));

    let overdue_ids = service
        .overdue_todos(&tenant)
        .unwrap()
        .into_iter()
        .map(|todo| todo.id)
        .collect::<Vec<_>>();
    assert_eq!(overdue_ids, vec![yesterday.id, nine_today.id]);

    service
        .update_status(&tenant, yesterday.id, TodoStatus::Completed, "JD")
        .unwrap();
    service
        .update_status(&tenant, nine_today.id, TodoStatus::Cancelled, "JD")
        .unwrap();
    assert!(service.overdue_todos(&tenant).unwrap().is_empty());
}

#[test]
fn completion_metadata_follows_status() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::with_clock(&repo, FixedClock::new(ten_am()));
    let tenant = tenant();

    let todo = service
        .create_todo(&tenant, draft("Replace wipers", None, None))
        .unwrap();
    assert_eq!(todo.status, TodoStatus::Pending);

    let done = service
        .update_status(&tenant, todo.id, TodoStatus::Completed, "AB")
        .unwrap();
    assert_eq!(done.completed_by.as_deref(), Some("AB"));
    assert_eq!(done.completed_at, Some(ten_am().and_utc()));

    let reopened = service
        .update_status(&tenant, todo.id, TodoStatus::InProgress, "AB")
        .unwrap();
    assert_eq!(reopened.completed_by, None);
    assert_eq!(reopened.completed_at, None);

    let mut edited = reopened.clone();
    edited.status = TodoStatus::Completed;
    let completed_by_edit = service.update_todo(&tenant, edited).unwrap();
    assert_eq!(completed_by_edit.completed_by.as_deref(), Some("JD"));
}

#[test]
fn validation_and_missing_todos_are_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::new(&repo);
    let tenant = tenant();

    assert!(matches!(
        service.create_todo(&tenant, draft(" ", None, None)).unwrap_err(),
        TodoServiceError::Validation(TodoValidationError::BlankTitle)
    ));
    assert!(matches!(
        service
            .create_todo(&tenant, draft("Timed", None, Some(at(9, 0))))
            .unwrap_err(),
        TodoServiceError::Validation(TodoValidationError::DueTimeWithoutDate)
    ));
    assert!(matches!(
        service.delete_todo(&tenant, Uuid::new_v4()).unwrap_err(),
        TodoServiceError::TodoNotFound(_)
    ));
}

#[test]
fn calendar_event_tracks_todo_due_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::with_clock(&repo, FixedClock::new(ten_am()));
    let calendar = CalendarService::new(&repo);
    let tenant = tenant();

    let todo = service
        .create_todo(&tenant, draft("Brake job", Some(day(6)), Some(at(14, 30))))
        .unwrap();
    let first = calendar.event_for_todo(&tenant, todo.id).unwrap().unwrap();
    assert_eq!(first.date, day(6));
    assert_eq!(first.time, Some(at(14, 30)));
    assert!(!first.all_day);

    let mut notes_only = todo.clone();
    notes_only.notes = Some("customer waiting".to_string());
    let todo = service.update_todo(&tenant, notes_only).unwrap();
    let unchanged = calendar.event_for_todo(&tenant, todo.id).unwrap().unwrap();
    assert_eq!(unchanged.id, first.id);

    let mut moved = todo.clone();
    moved.due_date = Some(day(8));
    moved.due_time = None;
    let todo = service.update_todo(&tenant, moved).unwrap();
    let regenerated = calendar.list_events(&tenant).unwrap();
    assert_eq!(regenerated.len(), 1);
    assert_ne!(regenerated[0].id, first.id);
    assert_eq!(regenerated[0].date, day(8));
    assert!(regenerated[0].all_day);
    assert!(calendar.events_on(&tenant, day(6)).unwrap().is_empty());

    let mut undated = todo.clone();
    undated.due_date = None;
    let todo = service.update_todo(&tenant, undated).unwrap();
    assert_eq!(calendar.event_for_todo(&tenant, todo.id).unwrap(), None);

    let mut redated = todo.clone();
    redated.due_date = Some(day(2));
    let todo = service.update_todo(&tenant, redated).unwrap();
    assert!(calendar.event_for_todo(&tenant, todo.id).unwrap().is_some());

    service.delete_todo(&tenant, todo.id).unwrap();
    assert!(calendar.list_events(&tenant).unwrap().is_empty());
}

#[test]
fn calendar_range_queries_are_inclusive_and_sorted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::with_clock(&repo, FixedClock::new(ten_am()));
    let calendar = CalendarService::new(&repo);
    let tenant = tenant();

    service
        .create_todo(&tenant, draft("Late", Some(day(3)), Some(at(16, 0))))
        .unwrap();
    service
        .create_todo(&tenant, draft("Early", Some(day(3)), Some(at(8, 0))))
        .unwrap();
    service
        .create_todo(&tenant, draft("Start", Some(day(1)), None))
        .unwrap();
    service
        .create_todo(&tenant, draft("Outside", Some(day(5)), None))
        .unwrap();

    let titles = calendar
        .events_between(&tenant, day(1), day(3))
        .unwrap()
        .into_iter()
        .map(|event| event.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Start", "Early", "Late"]);
}

#[test]
fn list_filters_search_and_stats() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSlotRepository::new(&conn);
    let service = TodoService::with_clock(&repo, FixedClock::new(ten_am()));
    let tenant = tenant();

    let mut urgent = draft("Replace windshield", Some(day(-2)), None);
    urgent.priority = TodoPriority::Urgent;
    urgent.category = TodoCategory::BodyWork;
    urgent.vehicle = Some(VehicleLink {
        id: "stock-1042".to_string(),
        name: "2021 Civic EX".to_string(),
    });
    urgent.tags = vec!["Glass".to_string(), "glass".to_string(), " ".to_string()];
    let urgent = service.create_todo(&tenant, urgent).unwrap();
    assert_eq!(urgent.tags, vec!["Glass"]);

    let mut low = draft("Take photos", Some(day(0)), None);
    low.priority = TodoPriority::Low;
    low.category = TodoCategory::Photos;
    low.assigned_to = "KT".to_string();
    service.create_todo(&tenant, low).unwrap();

    let finished = service
        .create_todo(&tenant, draft("Pricing review", Some(day(1)), None))
        .unwrap();
    service
        .update_status(&tenant, finished.id, TodoStatus::Completed, "JD")
        .unwrap();

    let civic = service.search_todos(&tenant, "CIVIC").unwrap();
    assert_eq!(civic.len(), 1);
    assert_eq!(civic[0].id, urgent.id);

    let by_tag = service.search_todos(&tenant, "GLASS").unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, urgent.id);

    let by_vehicle = service
        .list_todos(
            &tenant,
            &TodoQuery {
                vehicle_id: Some("stock-1042".to_string()),
                ..TodoQuery::default()
            },
        )
        .unwrap();
    assert_eq!(by_vehicle.len(), 1);

    let for_kt = service
        .list_todos(
            &tenant,
            &TodoQuery {
                assigned_to: Some("kt".to_string()),
                ..TodoQuery::default()
            },
        )
        .unwrap();
    assert_eq!(for_kt.len(), 1);

    let by_priority = service
        .list_todos(
            &tenant,
            &TodoQuery {
                sort: TodoSort::Priority,
                ..TodoQuery::default()
            },
        )
        .unwrap();
    assert_eq!(by_priority.first().map(|todo| todo.id), Some(urgent.id));

    assert_eq!(service.todos_due_on(&tenant, day(0)).unwrap().len(), 1);

    let stats = service.todo_stats(&tenant).unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.due_today, 1);
    assert_eq!(stats.open_high_priority, 1);
    assert_eq!(stats.open(), 2);
}
