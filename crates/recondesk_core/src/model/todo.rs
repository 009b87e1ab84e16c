//! Todo domain model and overdue rules.
//!
//! # Responsibility
//! - Define the reconditioning task record and its closed enums.
//! - Own status transition stamping and the overdue predicate.
//!
//! # Invariants
//! - `title` is never blank.
//! - `completed_at`/`completed_by` are set iff `status == Completed`.
//! - Any status may follow any other status.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TodoId = Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TodoPriority {
    pub const ALL: [TodoPriority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(value))
    }

    pub fn is_high_or_urgent(self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Accepts `in-progress` and `in_progress` spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&value))
    }

    /// Completed and cancelled todos are closed.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum TodoCategory {
    Mechanical,
    BodyWork,
    Detailing,
    Parts,
    Inspection,
    Photos,
    Paperwork,
    Pricing,
    FollowUp,
    #[default]
    General,
}

impl TodoCategory {
    pub const ALL: [TodoCategory; 10] = [
        Self::Mechanical,
        Self::BodyWork,
        Self::Detailing,
        Self::Parts,
        Self::Inspection,
        Self::Photos,
        Self::Paperwork,
        Self::Pricing,
        Self::FollowUp,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mechanical => "mechanical",
            Self::BodyWork => "body-work",
            Self::Detailing => "detailing",
            Self::Parts => "parts",
            Self::Inspection => "inspection",
            Self::Photos => "photos",
            Self::Paperwork => "paperwork",
            Self::Pricing => "pricing",
            Self::FollowUp => "follow-up",
            Self::General => "general",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }
}

/// Loose link to an inventory vehicle. The id is not checked against anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleLink {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    BlankTitle,
    DueTimeWithoutDate,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "todo title is required"),
            Self::DueTimeWithoutDate => write!(f, "due time requires a due date"),
        }
    }
}

impl Error for TodoValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TodoPriority,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub category: TodoCategory,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub assigned_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "clock_minutes"
    )]
    pub due_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleLink>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

/// Form input for a new todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub category: TodoCategory,
    pub assigned_to: String,
    pub assigned_by: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub vehicle: Option<VehicleLink>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

impl Todo {
    /// Builds a pending todo stamped at `now`.
    pub fn from_draft(draft: TodoDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description.filter(|value| !value.trim().is_empty()),
            priority: draft.priority,
            status: TodoStatus::Pending,
            category: draft.category,
            assigned_to: draft.assigned_to.trim().to_string(),
            assigned_by: draft.assigned_by.trim().to_string(),
            due_date: draft.due_date,
            due_time: draft.due_time.map(truncate_to_minute),
            vehicle: draft.vehicle,
            tags: normalize_tags(draft.tags),
            notes: draft.notes.filter(|value| !value.trim().is_empty()),
            created_at: now,
            updated_at: now,
            completed_at: None,
            completed_by: None,
        }
    }

    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.title.trim().is_empty() {
            return Err(TodoValidationError::BlankTitle);
        }
        if self.due_time.is_some() && self.due_date.is_none() {
            return Err(TodoValidationError::DueTimeWithoutDate);
        }
        Ok(())
    }

    /// Moves to `status`, stamping or clearing completion metadata.
    pub fn apply_status(&mut self, status: TodoStatus, actor: &str, now: DateTime<Utc>) {
        match (self.status, status) {
            (TodoStatus::Completed, TodoStatus::Completed) => {}
            (_, TodoStatus::Completed) => {
                self.completed_at = Some(now);
                self.completed_by = Some(actor.trim().to_string());
            }
            _ => {
                self.completed_at = None;
                self.completed_by = None;
            }
        }
        self.status = status;
        self.updated_at = now;
    }

    /// Overdue check against a local wall-clock `now`, at minute granularity.
    ///
    /// Closed todos and todos without a due date are never overdue. A todo due
    /// today without a time is not overdue until tomorrow.
    pub fn is_overdue_at(&self, now: NaiveDateTime) -> bool {
        if !self.status.is_open() {
            return false;
        }
        let Some(due_date) = self.due_date else {
            return false;
        };
        let today = now.date();
        if due_date < today {
            return true;
        }
        if due_date > today {
            return false;
        }
        match self.due_time {
            Some(due_time) => truncate_to_minute(due_time) < truncate_to_minute(now.time()),
            None => false,
        }
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.due_date == Some(date)
    }

    /// Fields matched by free-text search.
    pub(crate) fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.title.as_str()),
            self.description.as_deref(),
            self.notes.as_deref(),
            self.vehicle.as_ref().map(|vehicle| vehicle.name.as_str()),
            Some(self.assigned_to.as_str()),
        ]
        .into_iter()
        .flatten()
        .chain(self.tags.iter().map(String::as_str))
    }
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut result = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(trimmed.to_string());
    }
    result
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|value| value.with_nanosecond(0))
        .unwrap_or(time)
}

/// `HH:MM` wire format for optional due times; `HH:MM:SS` is accepted on read.
pub(crate) mod clock_minutes {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => NaiveTime::parse_from_str(text, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
                .map(Some)
                .map_err(|err| de::Error::custom(format!("invalid due time `{text}`: {err}"))),
        }
    }
}
