//! Todo manager use-cases.
//!
//! # Responsibility
//! - CRUD over the tenant `todos` slot.
//! - Keep the derived calendar events in step with todo due dates.
//! - Filtering, search, overdue and stats helpers.
//!
//! # Invariants
//! - Each dated todo has exactly one calendar event after any write here.
//! - Events are regenerated wholesale, never patched.
//! - Overdue is recomputed from the clock on every call.

use crate::clock::{Clock, SystemClock};
use crate::model::calendar::CalendarEvent;
use crate::model::tenant::TenantId;
use crate::model::todo::{
    normalize_tags, Todo, TodoCategory, TodoDraft, TodoId, TodoPriority, TodoStatus,
    TodoValidationError,
};
use crate::repo::collection::{load_collection, save_collection};
use crate::repo::slot_repo::{RepoError, SlotKey, SlotRepository};
use crate::service::calendar_service::{remove_events_for_todo, replace_event_for_todo};
use crate::service::matches_text;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TodoServiceError {
    Validation(TodoValidationError),
    TodoNotFound(TodoId),
    Repo(RepoError),
}

impl Display for TodoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TodoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::TodoNotFound(_) => None,
        }
    }
}

impl From<TodoValidationError> for TodoServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for TodoServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type TodoResult<T> = Result<T, TodoServiceError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoSort {
    /// Soonest first; undated todos last.
    #[default]
    DueDate,
    /// Urgent first, then by due date.
    Priority,
    /// Newest first.
    CreatedAt,
    Title,
}

/// Predicate chain applied by `list_todos`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub search: Option<String>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub category: Option<TodoCategory>,
    /// Case-insensitive match on assignee initials.
    pub assigned_to: Option<String>,
    pub vehicle_id: Option<String>,
    pub overdue_only: bool,
    pub due_on: Option<NaiveDate>,
    pub sort: TodoSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub open_high_priority: usize,
}

impl TodoStats {
    /// Tallies `todos` against the local wall-clock `now`.
    pub fn collect<'a>(todos: impl IntoIterator<Item = &'a Todo>, now: NaiveDateTime) -> Self {
        let today = now.date();
        let mut stats = Self::default();
        for todo in todos {
            stats.total += 1;
            match todo.status {
                TodoStatus::Pending => stats.pending += 1,
                TodoStatus::InProgress => stats.in_progress += 1,
                TodoStatus::Completed => stats.completed += 1,
                TodoStatus::Cancelled => stats.cancelled += 1,
            }
            if todo.is_overdue_at(now) {
                stats.overdue += 1;
            }
            if todo.is_due_on(today) {
                stats.due_today += 1;
            }
            if todo.status.is_open() && todo.priority.is_high_or_urgent() {
                stats.open_high_priority += 1;
            }
        }
        stats
    }

    pub fn open(&self) -> usize {
        self.pending + self.in_progress
    }

    pub fn combine(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            pending: self.pending + other.pending,
            in_progress: self.in_progress + other.in_progress,
            completed: self.completed + other.completed,
            cancelled: self.cancelled + other.cancelled,
            overdue: self.overdue + other.overdue,
            due_today: self.due_today + other.due_today,
            open_high_priority: self.open_high_priority + other.open_high_priority,
        }
    }
}

pub struct TodoService<R: SlotRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: SlotRepository> TodoService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: SlotRepository, C: Clock> TodoService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a pending todo and, when dated, its calendar event.
    ///
    /// # Side effects
    /// - Rewrites the tenant's `todos` slot, and `calendar_events` when the
    ///   todo has a due date.
    /// - Emits a `todo_create` logging event.
    ///
    /// # Errors
    /// - `TodoServiceError::Validation` when the title is blank or a due time
    ///   has no due date.
    /// - `TodoServiceError::Repo` when storage fails or holds malformed data.
    pub fn create_todo(&self, tenant: &TenantId, draft: TodoDraft) -> TodoResult<Todo> {
        let now = self.clock.now_utc();
        let todo = Todo::from_draft(draft, now);
        todo.validate()?;

        let mut todos = self.load(tenant)?;
        todos.push(todo.clone());
        self.save(tenant, &todos)?;
        let has_event = replace_event_for_todo(&self.repo, tenant, &todo, now)?;

        info!(
            "event=todo_create module=todos status=ok tenant={} todo_id={} calendar_event={}",
            tenant, todo.id, has_event
        );
        Ok(todo)
    }

    /// Replaces a stored todo.
    ///
    /// `created_at` is kept from storage and completion metadata follows the
    /// new status; a fresh completion is credited to `completed_by` when set,
    /// otherwise to the assignee. The calendar event is rebuilt when any
    /// projected field changed.
    ///
    /// # Errors
    /// - `TodoServiceError::Validation` for an invalid record.
    /// - `TodoServiceError::TodoNotFound` when no todo has that id.
    pub fn update_todo(&self, tenant: &TenantId, mut todo: Todo) -> TodoResult<Todo> {
        todo.tags = normalize_tags(std::mem::take(&mut todo.tags));
        todo.validate()?;
        let now = self.clock.now_utc();

        let mut todos = self.load(tenant)?;
        let stored = todos
            .iter_mut()
            .find(|stored| stored.id == todo.id)
            .ok_or(TodoServiceError::TodoNotFound(todo.id))?;

        let previous = stored.clone();
        let requested_status = todo.status;
        let actor = todo
            .completed_by
            .take()
            .unwrap_or_else(|| todo.assigned_to.clone());
        todo.status = previous.status;
        todo.completed_at = previous.completed_at;
        todo.completed_by = previous.completed_by.clone();
        todo.created_at = previous.created_at;
        todo.apply_status(requested_status, &actor, now);
        *stored = todo.clone();
        self.save(tenant, &todos)?;

        let regenerated = CalendarEvent::projection_changed(&previous, &todo);
        if regenerated {
            replace_event_for_todo(&self.repo, tenant, &todo, now)?;
        }
        info!(
            "event=todo_update module=todos status=ok tenant={} todo_id={} calendar_regenerated={}",
            tenant, todo.id, regenerated
        );
        Ok(todo)
    }

    /// Sets the status, stamping completion metadata with `actor`.
    ///
    /// # Contract
    /// - Entering `completed` stamps `completed_at` and `completed_by` once.
    /// - Leaving `completed` clears both.
    /// - The calendar event is rebuilt only when the status changed.
    pub fn update_status(
        &self,
        tenant: &TenantId,
        id: TodoId,
        status: TodoStatus,
        actor: &str,
    ) -> TodoResult<Todo> {
        let now = self.clock.now_utc();
        let mut todos = self.load(tenant)?;
        let stored = todos
            .iter_mut()
            .find(|stored| stored.id == id)
            .ok_or(TodoServiceError::TodoNotFound(id))?;
        let previous_status = stored.status;
        stored.apply_status(status, actor, now);
        let updated = stored.clone();
        self.save(tenant, &todos)?;

        if previous_status != status {
            replace_event_for_todo(&self.repo, tenant, &updated, now)?;
        }
        info!(
            "event=todo_status module=todos status=ok tenant={} todo_id={} from={} to={}",
            tenant,
            id,
            previous_status.as_str(),
            status.as_str()
        );
        Ok(updated)
    }

    /// Deletes the todo and every calendar event derived from it.
    ///
    /// # Errors
    /// - `TodoServiceError::TodoNotFound` when no todo has that id.
    pub fn delete_todo(&self, tenant: &TenantId, id: TodoId) -> TodoResult<()> {
        let mut todos = self.load(tenant)?;
        let before = todos.len();
        todos.retain(|todo| todo.id != id);
        if todos.len() == before {
            return Err(TodoServiceError::TodoNotFound(id));
        }
        self.save(tenant, &todos)?;
        let removed_events = remove_events_for_todo(&self.repo, tenant, id)?;
        info!(
            "event=todo_delete module=todos status=ok tenant={} todo_id={} removed_events={}",
            tenant, id, removed_events
        );
        Ok(())
    }

    pub fn get_todo(&self, tenant: &TenantId, id: TodoId) -> TodoResult<Option<Todo>> {
        Ok(self.load(tenant)?.into_iter().find(|todo| todo.id == id))
    }

    pub fn list_todos(&self, tenant: &TenantId, query: &TodoQuery) -> TodoResult<Vec<Todo>> {
        let now = self.clock.now_local();
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        let assignee = query
            .assigned_to
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty());

        let mut todos = self
            .load(tenant)?
            .into_iter()
            .filter(|todo| query.status.map_or(true, |status| todo.status == status))
            .filter(|todo| {
                query
                    .priority
                    .map_or(true, |priority| todo.priority == priority)
            })
            .filter(|todo| {
                query
                    .category
                    .map_or(true, |category| todo.category == category)
            })
            .filter(|todo| {
                assignee.map_or(true, |assignee| {
                    todo.assigned_to.eq_ignore_ascii_case(assignee)
                })
            })
            .filter(|todo| {
                query.vehicle_id.as_deref().map_or(true, |vehicle_id| {
                    todo.vehicle
                        .as_ref()
                        .is_some_and(|vehicle| vehicle.id == vehicle_id)
                })
            })
            .filter(|todo| !query.overdue_only || todo.is_overdue_at(now))
            .filter(|todo| query.due_on.map_or(true, |date| todo.is_due_on(date)))
            .filter(|todo| {
                needle
                    .as_deref()
                    .map_or(true, |needle| matches_text(todo.search_fields(), needle))
            })
            .collect::<Vec<_>>();

        todos.sort_by(|a, b| compare_todos(a, b, query.sort));
        Ok(todos)
    }

    /// Case-insensitive search over title, description, notes, tags, vehicle
    /// name and assignee.
    pub fn search_todos(&self, tenant: &TenantId, text: &str) -> TodoResult<Vec<Todo>> {
        self.list_todos(
            tenant,
            &TodoQuery {
                search: Some(text.to_string()),
                ..TodoQuery::default()
            },
        )
    }

    pub fn overdue_todos(&self, tenant: &TenantId) -> TodoResult<Vec<Todo>> {
        self.list_todos(
            tenant,
            &TodoQuery {
                overdue_only: true,
                ..TodoQuery::default()
            },
        )
    }

    pub fn todos_due_on(&self, tenant: &TenantId, date: NaiveDate) -> TodoResult<Vec<Todo>> {
        self.list_todos(
            tenant,
            &TodoQuery {
                due_on: Some(date),
                ..TodoQuery::default()
            },
        )
    }

    /// Whether the todo is overdue right now.
    pub fn is_overdue(&self, todo: &Todo) -> bool {
        todo.is_overdue_at(self.clock.now_local())
    }

    pub fn todo_stats(&self, tenant: &TenantId) -> TodoResult<TodoStats> {
        let todos = self.load(tenant)?;
        Ok(TodoStats::collect(&todos, self.clock.now_local()))
    }

    fn load(&self, tenant: &TenantId) -> TodoResult<Vec<Todo>> {
        Ok(load_collection(&self.repo, tenant.into(), SlotKey::Todos)?)
    }

    fn save(&self, tenant: &TenantId, todos: &[Todo]) -> TodoResult<()> {
        Ok(save_collection(
            &self.repo,
            tenant.into(),
            SlotKey::Todos,
            todos,
        )?)
    }
}

fn compare_todos(a: &Todo, b: &Todo, sort: TodoSort) -> Ordering {
    let by_due = || compare_due(a, b);
    match sort {
        TodoSort::DueDate => by_due().then_with(|| b.priority.cmp(&a.priority)),
        TodoSort::Priority => b.priority.cmp(&a.priority).then_with(by_due),
        TodoSort::CreatedAt => b.created_at.cmp(&a.created_at),
        TodoSort::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(by_due),
    }
}

fn compare_due(a: &Todo, b: &Todo) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right).then_with(|| a.due_time.cmp(&b.due_time)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
