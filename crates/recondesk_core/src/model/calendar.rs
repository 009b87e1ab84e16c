//! Calendar events derived from dated todos.
//!
//! # Invariants
//! - At most one event exists per `todo_id`.
//! - Events are never edited in place; they are rebuilt from the todo.

use crate::model::todo::{Todo, TodoCategory, TodoId, TodoPriority, TodoStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub todo_id: TodoId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::model::todo::clock_minutes"
    )]
    pub time: Option<NaiveTime>,
    pub all_day: bool,
    pub priority: TodoPriority,
    pub category: TodoCategory,
    pub status: TodoStatus,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Projects `todo` onto the calendar. Undated todos have no event.
    pub fn from_todo(todo: &Todo, now: DateTime<Utc>) -> Option<Self> {
        let date = todo.due_date?;
        Some(Self {
            id: Uuid::new_v4(),
            todo_id: todo.id,
            title: todo.title.clone(),
            date,
            time: todo.due_time,
            all_day: todo.due_time.is_none(),
            priority: todo.priority,
            category: todo.category,
            status: todo.status,
            assigned_to: todo.assigned_to.clone(),
            vehicle_name: todo.vehicle.as_ref().map(|vehicle| vehicle.name.clone()),
            created_at: now,
        })
    }

    /// Whether `before` and `after` project to different calendar content.
    pub fn projection_changed(before: &Todo, after: &Todo) -> bool {
        before.title != after.title
            || before.due_date != after.due_date
            || before.due_time != after.due_time
            || before.priority != after.priority
            || before.category != after.category
            || before.status != after.status
            || before.assigned_to != after.assigned_to
            || before.vehicle != after.vehicle
    }
}

#[cfg(test)]
mod tests {
    use super::CalendarEvent;
    use crate::model::todo::{Todo, TodoDraft, TodoPriority};
    use chrono::{NaiveDate, NaiveTime, Utc};

    #[test]
    fn undated_todo_has_no_event() {
        let todo = Todo::from_draft(
            TodoDraft {
                title: "Order mats".to_string(),
                ..TodoDraft::default()
            },
            Utc::now(),
        );
        assert!(CalendarEvent::from_todo(&todo, Utc::now()).is_none());
    }

    #[test]
    fn event_without_time_is_all_day() {
        let todo = Todo::from_draft(
            TodoDraft {
                title: "Safety inspection".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 4, 2),
                ..TodoDraft::default()
            },
            Utc::now(),
        );
        let event = CalendarEvent::from_todo(&todo, Utc::now()).unwrap();
        assert!(event.all_day);
        assert_eq!(event.todo_id, todo.id);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 4, 2).unwrap());
    }

    #[test]
    fn projection_changed_ignores_notes_but_not_due_time() {
        let before = Todo::from_draft(
            TodoDraft {
                title: "Photos".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 4, 2),
                ..TodoDraft::default()
            },
            Utc::now(),
        );
        let mut after = before.clone();
        after.notes = Some("use lot C".to_string());
        assert!(!CalendarEvent::projection_changed(&before, &after));

        after.due_time = NaiveTime::from_hms_opt(15, 0, 0);
        assert!(CalendarEvent::projection_changed(&before, &after));

        let mut reprioritized = before.clone();
        reprioritized.priority = TodoPriority::Urgent;
        assert!(CalendarEvent::projection_changed(&before, &reprioritized));
    }
}
