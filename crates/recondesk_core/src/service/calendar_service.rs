//! Calendar views over events derived from todos.
//!
//! Writes happen only through the todo manager; this module exposes the
//! read side plus the crate-internal regeneration helpers.

use crate::model::calendar::CalendarEvent;
use crate::model::tenant::TenantId;
use crate::model::todo::{Todo, TodoId};
use crate::repo::collection::{load_collection, save_collection};
use crate::repo::slot_repo::{RepoResult, SlotKey, SlotRepository};
use chrono::{DateTime, NaiveDate, Utc};

pub struct CalendarService<R: SlotRepository> {
    repo: R,
}

impl<R: SlotRepository> CalendarService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All events, sorted by date then time (all-day first).
    pub fn list_events(&self, tenant: &TenantId) -> RepoResult<Vec<CalendarEvent>> {
        let mut events = load_events(&self.repo, tenant)?;
        sort_events(&mut events);
        Ok(events)
    }

    /// Events dated within `from..=to`.
    pub fn events_between(
        &self,
        tenant: &TenantId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<CalendarEvent>> {
        let mut events = self.list_events(tenant)?;
        events.retain(|event| event.date >= from && event.date <= to);
        Ok(events)
    }

    pub fn events_on(&self, tenant: &TenantId, date: NaiveDate) -> RepoResult<Vec<CalendarEvent>> {
        self.events_between(tenant, date, date)
    }

    pub fn event_for_todo(
        &self,
        tenant: &TenantId,
        todo_id: TodoId,
    ) -> RepoResult<Option<CalendarEvent>> {
        Ok(load_events(&self.repo, tenant)?
            .into_iter()
            .find(|event| event.todo_id == todo_id))
    }
}

/// Drops every event for `todo.id` and recreates it when the todo is dated.
///
/// Returns whether an event exists afterwards.
pub(crate) fn replace_event_for_todo(
    repo: &impl SlotRepository,
    tenant: &TenantId,
    todo: &Todo,
    now: DateTime<Utc>,
) -> RepoResult<bool> {
    let mut events = load_events(repo, tenant)?;
    events.retain(|event| event.todo_id != todo.id);
    let created = match CalendarEvent::from_todo(todo, now) {
        Some(event) => {
            events.push(event);
            true
        }
        None => false,
    };
    save_collection(repo, tenant.into(), SlotKey::CalendarEvents, &events)?;
    Ok(created)
}

/// Removes events derived from `todo_id`; returns how many were dropped.
pub(crate) fn remove_events_for_todo(
    repo: &impl SlotRepository,
    tenant: &TenantId,
    todo_id: TodoId,
) -> RepoResult<usize> {
    let mut events = load_events(repo, tenant)?;
    let before = events.len();
    events.retain(|event| event.todo_id != todo_id);
    let removed = before - events.len();
    if removed > 0 {
        save_collection(repo, tenant.into(), SlotKey::CalendarEvents, &events)?;
    }
    Ok(removed)
}

fn load_events(repo: &impl SlotRepository, tenant: &TenantId) -> RepoResult<Vec<CalendarEvent>> {
    load_collection(repo, tenant.into(), SlotKey::CalendarEvents)
}

fn sort_events(events: &mut [CalendarEvent]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.cmp(&b.time))
            .then_with(|| b.priority.cmp(&a.priority))
    });
}
