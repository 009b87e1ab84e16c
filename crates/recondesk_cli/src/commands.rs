use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Subcommand, ValueEnum};
use recondesk_core::integrations::supabase::{Filter, Table};
use recondesk_core::model::todo::VehicleLink;
use recondesk_core::service::contact_service::ContactSort;
use recondesk_core::service::todo_service::TodoSort;
use recondesk_core::{
    Contact, ContactCategory, TenantId, Todo, TodoCategory, TodoPriority, TodoStatus,
};
use serde_json::Value;
use uuid::Uuid;

#[derive(Subcommand)]
pub(crate) enum ContactCommand {
    Add {
        name: String,
        phone: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long, value_parser = contact_category, default_value = "other")]
        category: ContactCategory,
        #[arg(long = "specialty")]
        specialties: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_parser = contact_category)]
        category: Option<ContactCategory>,
        #[arg(long, default_value_t = false)]
        favorites: bool,
        /// Include inactive contacts.
        #[arg(long, default_value_t = false)]
        all: bool,
        #[arg(long, value_enum, default_value_t = ContactSortCli::Name)]
        sort: ContactSortCli,
    },
    Show {
        id: Uuid,
    },
    /// Change fields of a stored contact; omitted flags keep their value.
    Edit {
        id: Uuid,
        #[command(flatten)]
        changes: ContactEdit,
    },
    Favorite {
        id: Uuid,
    },
    Activate {
        id: Uuid,
    },
    Deactivate {
        id: Uuid,
    },
    /// Log a call made now.
    Call {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
    Stats,
}

#[derive(Subcommand)]
pub(crate) enum TodoCommand {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = todo_priority, default_value = "medium")]
        priority: TodoPriority,
        #[arg(long, value_parser = todo_category, default_value = "general")]
        category: TodoCategory,
        #[arg(long = "assign", default_value = "")]
        assigned_to: String,
        #[arg(long = "by", default_value = "")]
        assigned_by: String,
        #[arg(long, value_parser = date)]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = clock_time, requires = "due")]
        at: Option<NaiveTime>,
        #[arg(long, requires = "vehicle_name")]
        vehicle_id: Option<String>,
        #[arg(long, requires = "vehicle_id")]
        vehicle_name: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_parser = todo_status)]
        status: Option<TodoStatus>,
        #[arg(long, value_parser = todo_priority)]
        priority: Option<TodoPriority>,
        #[arg(long, value_parser = todo_category)]
        category: Option<TodoCategory>,
        #[arg(long)]
        assigned: Option<String>,
        #[arg(long)]
        vehicle: Option<String>,
        #[arg(long, default_value_t = false)]
        overdue: bool,
        #[arg(long, value_parser = date)]
        due: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = TodoSortCli::Due)]
        sort: TodoSortCli,
    },
    Show {
        id: Uuid,
    },
    /// Change fields of a stored todo; omitted flags keep their value.
    Edit {
        id: Uuid,
        #[command(flatten)]
        changes: TodoEdit,
    },
    Status {
        id: Uuid,
        #[arg(value_parser = todo_status)]
        status: TodoStatus,
        #[arg(long = "by", default_value = "")]
        actor: String,
    },
    /// Move or clear the due date; the calendar event follows.
    Reschedule {
        id: Uuid,
        #[arg(long, value_parser = date, required_unless_present = "clear")]
        due: Option<NaiveDate>,
        #[arg(long, value_parser = clock_time, requires = "due")]
        at: Option<NaiveTime>,
        #[arg(long, default_value_t = false, conflicts_with = "due")]
        clear: bool,
    },
    Delete {
        id: Uuid,
    },
    Overdue,
    Stats,
}

#[derive(Subcommand)]
pub(crate) enum CalendarCommand {
    List {
        #[arg(long, value_parser = date, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = date, requires = "from")]
        to: Option<NaiveDate>,
    },
    Day {
        #[arg(value_parser = date)]
        date: NaiveDate,
    },
    /// The event generated for one todo.
    Todo {
        id: Uuid,
    },
}

#[derive(Subcommand)]
pub(crate) enum AdminCommand {
    Register {
        #[arg(value_parser = tenant_id)]
        id: TenantId,
        name: String,
        #[arg(long)]
        location: Option<String>,
    },
    List,
    Activate {
        #[arg(value_parser = tenant_id)]
        id: TenantId,
    },
    Deactivate {
        #[arg(value_parser = tenant_id)]
        id: TenantId,
    },
    Overview,
}

#[derive(Subcommand)]
pub(crate) enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        default_assignee: Option<String>,
        #[arg(long)]
        deploy_url: Option<String>,
    },
}

#[derive(Subcommand)]
pub(crate) enum GithubCommand {
    /// Store credentials in the dealership settings.
    Connect {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        repo: String,
        #[arg(long, default_value = "main")]
        branch: String,
        #[arg(long)]
        token: String,
    },
    Disconnect,
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    Commit {
        path: String,
        #[arg(long)]
        message: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        #[arg(long)]
        file: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
pub(crate) enum DeployCommand {
    Status {
        /// Keep polling and print every snapshot.
        #[arg(long, default_value_t = false)]
        watch: bool,
        /// Stop watching after this many snapshots.
        #[arg(long, requires = "watch")]
        count: Option<usize>,
    },
}

#[derive(Subcommand)]
pub(crate) enum BackendCommand {
    Status,
    Select {
        #[arg(value_parser = table)]
        table: Table,
        /// Equality filter as `column=value`; repeatable.
        #[arg(long = "eq", value_parser = eq_filter)]
        filters: Vec<Filter>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Insert a JSON object, or an array of objects.
    Insert {
        #[arg(value_parser = table)]
        table: Table,
        #[arg(value_parser = json_rows)]
        row: Value,
    },
    /// Apply a JSON object patch to every row matching the filters.
    Update {
        #[arg(value_parser = table)]
        table: Table,
        #[arg(long = "eq", value_parser = eq_filter, required = true)]
        filters: Vec<Filter>,
        #[arg(value_parser = json_object)]
        patch: Value,
    },
    Delete {
        #[arg(value_parser = table)]
        table: Table,
        #[arg(long = "eq", value_parser = eq_filter, required = true)]
        filters: Vec<Filter>,
    },
}

/// Optional text flags take an empty string to clear the field.
#[derive(Args, Debug, Default)]
pub(crate) struct ContactEdit {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long, value_parser = contact_category)]
    category: Option<ContactCategory>,
    /// Replaces the whole specialty list.
    #[arg(long = "specialty")]
    specialties: Vec<String>,
    #[arg(long, default_value_t = false, conflicts_with = "specialties")]
    clear_specialties: bool,
    #[arg(long)]
    notes: Option<String>,
}

impl ContactEdit {
    pub(crate) fn apply(self, contact: &mut Contact) {
        if let Some(name) = self.name {
            contact.name = name;
        }
        if let Some(phone) = self.phone {
            contact.phone = phone;
        }
        set_optional(&mut contact.company, self.company);
        set_optional(&mut contact.title, self.title);
        set_optional(&mut contact.email, self.email);
        set_optional(&mut contact.address, self.address);
        if let Some(category) = self.category {
            contact.category = category;
        }
        if self.clear_specialties {
            contact.specialties.clear();
        } else if !self.specialties.is_empty() {
            contact.specialties = self.specialties;
        }
        if let Some(notes) = self.notes {
            contact.notes = notes;
        }
    }
}

/// Due dates move through `todo reschedule`; status through `todo status`.
#[derive(Args, Debug, Default)]
pub(crate) struct TodoEdit {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = todo_priority)]
    priority: Option<TodoPriority>,
    #[arg(long, value_parser = todo_category)]
    category: Option<TodoCategory>,
    #[arg(long = "assign")]
    assigned_to: Option<String>,
    #[arg(long, requires = "vehicle_name")]
    vehicle_id: Option<String>,
    #[arg(long, requires = "vehicle_id")]
    vehicle_name: Option<String>,
    #[arg(long, default_value_t = false, conflicts_with = "vehicle_id")]
    clear_vehicle: bool,
    /// Replaces the whole tag list.
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long, default_value_t = false, conflicts_with = "tags")]
    clear_tags: bool,
    #[arg(long)]
    notes: Option<String>,
}

impl TodoEdit {
    pub(crate) fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        set_optional(&mut todo.description, self.description);
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
        if let Some(assigned_to) = self.assigned_to {
            todo.assigned_to = assigned_to;
        }
        if self.clear_vehicle {
            todo.vehicle = None;
        } else if let (Some(id), Some(name)) = (self.vehicle_id, self.vehicle_name) {
            todo.vehicle = Some(VehicleLink { id, name });
        }
        if self.clear_tags {
            todo.tags.clear();
        } else if !self.tags.is_empty() {
            todo.tags = self.tags;
        }
        set_optional(&mut todo.notes, self.notes);
    }
}

fn set_optional(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = Some(value).filter(|value| !value.trim().is_empty());
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ContactSortCli {
    Name,
    Company,
    Recent,
    Added,
}

impl From<ContactSortCli> for ContactSort {
    fn from(value: ContactSortCli) -> Self {
        match value {
            ContactSortCli::Name => Self::Name,
            ContactSortCli::Company => Self::Company,
            ContactSortCli::Recent => Self::RecentlyContacted,
            ContactSortCli::Added => Self::RecentlyAdded,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum TodoSortCli {
    Due,
    Priority,
    Created,
    Title,
}

impl From<TodoSortCli> for TodoSort {
    fn from(value: TodoSortCli) -> Self {
        match value {
            TodoSortCli::Due => Self::DueDate,
            TodoSortCli::Priority => Self::Priority,
            TodoSortCli::Created => Self::CreatedAt,
            TodoSortCli::Title => Self::Title,
        }
    }
}

pub(crate) fn tenant_id(value: &str) -> Result<TenantId, String> {
    TenantId::parse(value).map_err(|err| err.to_string())
}

fn date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD, got `{value}`"))
}

fn clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("expected HH:MM, got `{value}`"))
}

fn contact_category(value: &str) -> Result<ContactCategory, String> {
    ContactCategory::parse(value).ok_or_else(|| {
        one_of(
            value,
            ContactCategory::ALL.iter().map(|category| category.as_str()),
        )
    })
}

fn todo_priority(value: &str) -> Result<TodoPriority, String> {
    TodoPriority::parse(value).ok_or_else(|| {
        one_of(
            value,
            TodoPriority::ALL.iter().map(|priority| priority.as_str()),
        )
    })
}

fn todo_status(value: &str) -> Result<TodoStatus, String> {
    TodoStatus::parse(value).ok_or_else(|| {
        one_of(
            value,
            TodoStatus::ALL.iter().map(|status| status.as_str()),
        )
    })
}

fn todo_category(value: &str) -> Result<TodoCategory, String> {
    TodoCategory::parse(value).ok_or_else(|| {
        one_of(
            value,
            TodoCategory::ALL.iter().map(|category| category.as_str()),
        )
    })
}

fn table(value: &str) -> Result<Table, String> {
    Table::parse(value).ok_or_else(|| one_of(value, Table::ALL.iter().map(|table| table.as_str())))
}

fn eq_filter(value: &str) -> Result<Filter, String> {
    let (column, filter_value) = value
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got `{value}`"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column in `{value}`"));
    }
    Ok(Filter::eq(column, filter_value.trim()))
}

fn json_object(value: &str) -> Result<Value, String> {
    match serde_json::from_str(value) {
        Ok(object @ Value::Object(_)) => Ok(object),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(err) => Err(format!("invalid JSON: {err}")),
    }
}

fn json_rows(value: &str) -> Result<Value, String> {
    match serde_json::from_str(value) {
        Ok(Value::Array(rows)) if rows.iter().all(Value::is_object) => Ok(Value::Array(rows)),
        Ok(object @ Value::Object(_)) => Ok(object),
        Ok(_) => Err("expected a JSON object or an array of objects".to_string()),
        Err(err) => Err(format!("invalid JSON: {err}")),
    }
}

fn one_of<'a>(value: &str, allowed: impl Iterator<Item = &'a str>) -> String {
    format!(
        "unknown value `{value}`; expected one of: {}",
        allowed.collect::<Vec<_>>().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::{
        clock_time, date, eq_filter, json_object, json_rows, table, todo_status, ContactEdit,
        TodoEdit,
    };
    use chrono::Utc;
    use recondesk_core::integrations::supabase::Table;
    use recondesk_core::model::todo::VehicleLink;
    use recondesk_core::{
        Contact, ContactCategory, ContactDraft, Todo, TodoDraft, TodoPriority, TodoStatus,
    };

    #[test]
    fn value_parsers_accept_expected_formats() {
        assert!(date("2026-03-14").is_ok());
        assert!(date("03/14/2026").is_err());
        assert!(clock_time("09:30").is_ok());
        assert!(clock_time("9am").is_err());
        assert_eq!(table("Vehicles").unwrap(), Table::Vehicles);
        assert_eq!(todo_status("in-progress").unwrap(), TodoStatus::InProgress);
    }

    #[test]
    fn eq_filter_splits_on_first_equals() {
        let filter = eq_filter("notes=a=b").unwrap();
        assert_eq!(filter.column, "notes");
        assert_eq!(filter.value, "a=b");
        assert!(eq_filter("=x").is_err());
        assert!(eq_filter("novalue").is_err());
    }

    #[test]
    fn unknown_enum_values_list_the_choices() {
        let err = todo_status("done").unwrap_err();
        assert!(err.contains("completed"));
    }

    #[test]
    fn contact_edit_keeps_omitted_fields_and_clears_blank_ones() {
        let mut contact = Contact::from_draft(
            ContactDraft {
                name: "Lee Park".to_string(),
                phone: "5551234567".to_string(),
                company: Some("Acme Detailing".to_string()),
                title: Some("Owner".to_string()),
                specialties: vec!["Ceramic".to_string()],
                ..ContactDraft::default()
            },
            Utc::now(),
        );

        ContactEdit {
            phone: Some("5559876543".to_string()),
            company: Some(String::new()),
            category: Some(ContactCategory::Detailer),
            specialties: vec!["Paint correction".to_string()],
            ..ContactEdit::default()
        }
        .apply(&mut contact);

        assert_eq!(contact.name, "Lee Park");
        assert_eq!(contact.phone, "5559876543");
        assert_eq!(contact.company, None);
        assert_eq!(contact.title.as_deref(), Some("Owner"));
        assert_eq!(contact.category, ContactCategory::Detailer);
        assert_eq!(contact.specialties, vec!["Paint correction"]);

        ContactEdit {
            clear_specialties: true,
            ..ContactEdit::default()
        }
        .apply(&mut contact);
        assert!(contact.specialties.is_empty());
    }

    #[test]
    fn todo_edit_replaces_vehicle_and_tags() {
        let mut todo = Todo::from_draft(
            TodoDraft {
                title: "Detail".to_string(),
                tags: vec!["interior".to_string()],
                vehicle: Some(VehicleLink {
                    id: "stock-1".to_string(),
                    name: "2019 Accord".to_string(),
                }),
                ..TodoDraft::default()
            },
            Utc::now(),
        );

        TodoEdit {
            priority: Some(TodoPriority::Urgent),
            assigned_to: Some("KT".to_string()),
            vehicle_id: Some("stock-2".to_string()),
            vehicle_name: Some("2021 Civic".to_string()),
            tags: vec!["glass".to_string()],
            ..TodoEdit::default()
        }
        .apply(&mut todo);

        assert_eq!(todo.title, "Detail");
        assert_eq!(todo.priority, TodoPriority::Urgent);
        assert_eq!(todo.assigned_to, "KT");
        assert_eq!(todo.vehicle.as_ref().map(|v| v.id.as_str()), Some("stock-2"));
        assert_eq!(todo.tags, vec!["glass"]);

        TodoEdit {
            clear_vehicle: true,
            clear_tags: true,
            ..TodoEdit::default()
        }
        .apply(&mut todo);
        assert_eq!(todo.vehicle, None);
        assert!(todo.tags.is_empty());
    }

    #[test]
    fn json_parsers_require_objects() {
        assert!(json_object(r#"{"status":"completed"}"#).is_ok());
        assert!(json_object("[1]").is_err());
        assert!(json_object("{not json").is_err());
        assert!(json_rows(r#"[{"title":"a"},{"title":"b"}]"#).is_ok());
        assert!(json_rows(r#"{"title":"a"}"#).is_ok());
        assert!(json_rows("[1, 2]").is_err());
    }
}
