//! Text and JSON rendering for command results.

use chrono::NaiveDateTime;
use recondesk_core::integrations::deploy::DeployStatus;
use recondesk_core::integrations::github::ContentEntry;
use recondesk_core::integrations::poller::PollSnapshot;
use recondesk_core::model::calendar::CalendarEvent;
use recondesk_core::model::dealership::Dealership;
use recondesk_core::service::contact_service::ContactStats;
use recondesk_core::service::dashboard_service::AdminOverview;
use recondesk_core::service::todo_service::TodoStats;
use recondesk_core::{format_phone, Contact, Todo};
use serde::Serialize;
use serde_json::{json, Value};

pub(crate) struct Output {
    json: bool,
}

impl Output {
    pub(crate) fn new(json: bool) -> Self {
        Self { json }
    }

    pub(crate) fn contacts(&self, contacts: &[Contact]) -> serde_json::Result<()> {
        self.emit(contacts, || {
            contacts.iter().map(contact_line).collect::<Vec<_>>().join("\n")
        })
    }

    pub(crate) fn contact(&self, contact: &Contact) -> serde_json::Result<()> {
        self.emit(contact, || contact_line(contact))
    }

    pub(crate) fn todos(&self, todos: &[Todo], now: NaiveDateTime) -> serde_json::Result<()> {
        self.emit(todos, || {
            todos
                .iter()
                .map(|todo| todo_line(todo, now))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub(crate) fn todo(&self, todo: &Todo, now: NaiveDateTime) -> serde_json::Result<()> {
        self.emit(todo, || todo_line(todo, now))
    }

    pub(crate) fn is_json(&self) -> bool {
        self.json
    }

    pub(crate) fn event(&self, event: &CalendarEvent) -> serde_json::Result<()> {
        self.emit(event, || event_line(event))
    }

    pub(crate) fn events(&self, events: &[CalendarEvent]) -> serde_json::Result<()> {
        self.emit(events, || {
            events.iter().map(event_line).collect::<Vec<_>>().join("\n")
        })
    }

    pub(crate) fn dealerships(&self, dealerships: &[Dealership]) -> serde_json::Result<()> {
        self.emit(dealerships, || {
            dealerships
                .iter()
                .map(dealership_line)
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub(crate) fn dealership(&self, dealership: &Dealership) -> serde_json::Result<()> {
        self.emit(dealership, || dealership_line(dealership))
    }

    pub(crate) fn contact_stats(&self, stats: &ContactStats) -> serde_json::Result<()> {
        let by_category = stats
            .by_category
            .iter()
            .map(|(category, count)| (category.as_str().to_string(), json!(count)))
            .collect::<serde_json::Map<_, _>>();
        let value = json!({
            "total": stats.total,
            "active": stats.active,
            "favorites": stats.favorites,
            "contactedLast30Days": stats.contacted_last_30_days,
            "byCategory": by_category,
        });
        self.emit(&value, || {
            let mut text = format!(
                "total={} active={} favorites={} contacted_last_30_days={}",
                stats.total, stats.active, stats.favorites, stats.contacted_last_30_days
            );
            for (category, count) in &stats.by_category {
                text.push_str(&format!("\n  {category}: {count}", category = category.as_str()));
            }
            text
        })
    }

    pub(crate) fn todo_stats(&self, stats: &TodoStats) -> serde_json::Result<()> {
        self.emit(&todo_stats_json(stats), || todo_stats_line(stats))
    }

    pub(crate) fn overview(&self, overview: &AdminOverview) -> serde_json::Result<()> {
        let per_dealership = overview
            .per_dealership
            .iter()
            .map(|summary| {
                json!({
                    "id": summary.id,
                    "name": summary.name,
                    "registered": summary.is_registered(),
                    "isActive": summary.is_active,
                    "contacts": summary.contacts,
                    "activeContacts": summary.active_contacts,
                    "todos": todo_stats_json(&summary.todos),
                })
            })
            .collect::<Vec<_>>();
        let value = json!({
            "dealershipsTotal": overview.dealerships_total,
            "dealershipsActive": overview.dealerships_active,
            "unregisteredTenants": overview.unregistered_tenants,
            "contactsTotal": overview.contacts_total,
            "todos": todo_stats_json(&overview.todos),
            "perDealership": per_dealership,
        });
        self.emit(&value, || {
            let mut text = format!(
                "dealerships={} active={} unregistered={} contacts={}\ntodos: {}",
                overview.dealerships_total,
                overview.dealerships_active,
                overview.unregistered_tenants,
                overview.contacts_total,
                todo_stats_line(&overview.todos)
            );
            for summary in &overview.per_dealership {
                text.push_str(&format!(
                    "\n  {id:<20} {name:<24} contacts={contacts} open={open} overdue={overdue}{flag}",
                    id = summary.id,
                    name = summary.name.as_deref().unwrap_or("(unregistered)"),
                    contacts = summary.contacts,
                    open = summary.todos.open(),
                    overdue = summary.todos.overdue,
                    flag = if summary.is_active { "" } else { " inactive" },
                ));
            }
            text
        })
    }

    pub(crate) fn contents(&self, entries: &[ContentEntry]) -> serde_json::Result<()> {
        self.emit(entries, || {
            entries
                .iter()
                .map(|entry| format!("{:<5} {:>8}  {}", entry.kind, entry.size, entry.path))
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    pub(crate) fn deploy_snapshot(
        &self,
        snapshot: &PollSnapshot<DeployStatus>,
    ) -> serde_json::Result<()> {
        let value = match snapshot {
            PollSnapshot::Waiting => json!({ "state": "pending" }),
            PollSnapshot::Ready { value, .. } => serde_json::to_value(value)?,
            PollSnapshot::Failed { message, polled_at } => json!({
                "state": "error",
                "message": message,
                "checkedAt": polled_at,
            }),
        };
        self.emit(&value, || match snapshot {
            PollSnapshot::Waiting => "deploy: pending".to_string(),
            PollSnapshot::Ready { value, .. } => format!(
                "deploy: {state}{url}{message}",
                state = value.state,
                url = value
                    .url
                    .as_deref()
                    .map(|url| format!(" {url}"))
                    .unwrap_or_default(),
                message = value
                    .message
                    .as_deref()
                    .map(|message| format!(" ({message})"))
                    .unwrap_or_default(),
            ),
            PollSnapshot::Failed { message, .. } => format!("deploy: error ({message})"),
        })
    }

    pub(crate) fn rows(&self, rows: &[Value]) -> serde_json::Result<()> {
        if self.json {
            return self.emit(rows, String::new);
        }
        for row in rows {
            println!("{}", serde_json::to_string(row)?);
        }
        Ok(())
    }

    pub(crate) fn message(&self, text: &str) -> serde_json::Result<()> {
        self.emit(&json!({ "message": text }), || text.to_string())
    }

    fn emit<T: Serialize + ?Sized>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> serde_json::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let text = text();
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Ok(())
    }
}

fn contact_line(contact: &Contact) -> String {
    format!(
        "{id}  {name:<24} {phone:<16} {company:<20} [{category}]{favorite}{inactive}",
        id = contact.id,
        name = contact.name,
        phone = format_phone(&contact.phone),
        company = contact.company.as_deref().unwrap_or("-"),
        category = contact.category.as_str(),
        favorite = if contact.is_favorite { " *" } else { "" },
        inactive = if contact.is_active { "" } else { " (inactive)" },
    )
}

fn todo_line(todo: &Todo, now: NaiveDateTime) -> String {
    let due = match (todo.due_date, todo.due_time) {
        (Some(date), Some(time)) => format!("{date} {}", time.format("%H:%M")),
        (Some(date), None) => date.to_string(),
        (None, _) => "-".to_string(),
    };
    format!(
        "{id}  [{status}] {priority:<6} {title:<32} due {due:<16} @{assignee}{vehicle}{overdue}",
        id = todo.id,
        status = todo.status.as_str(),
        priority = todo.priority.as_str(),
        title = todo.title,
        assignee = if todo.assigned_to.is_empty() {
            "-"
        } else {
            todo.assigned_to.as_str()
        },
        vehicle = todo
            .vehicle
            .as_ref()
            .map(|vehicle| format!(" [{}]", vehicle.name))
            .unwrap_or_default(),
        overdue = if todo.is_overdue_at(now) {
            " OVERDUE"
        } else {
            ""
        },
    )
}

fn event_line(event: &CalendarEvent) -> String {
    let time = event
        .time
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|| "all-day".to_string());
    format!(
        "{date} {time:<7} {title} ({priority}, {status})",
        date = event.date,
        title = event.title,
        priority = event.priority.as_str(),
        status = event.status.as_str(),
    )
}

fn dealership_line(dealership: &Dealership) -> String {
    format!(
        "{id:<20} {name:<24} {location}{inactive}",
        id = dealership.id,
        name = dealership.name,
        location = dealership.location.as_deref().unwrap_or("-"),
        inactive = if dealership.is_active { "" } else { " (inactive)" },
    )
}

fn todo_stats_json(stats: &TodoStats) -> Value {
    json!({
        "total": stats.total,
        "pending": stats.pending,
        "inProgress": stats.in_progress,
        "completed": stats.completed,
        "cancelled": stats.cancelled,
        "overdue": stats.overdue,
        "dueToday": stats.due_today,
        "openHighPriority": stats.open_high_priority,
    })
}

fn todo_stats_line(stats: &TodoStats) -> String {
    format!(
        "total={} pending={} in_progress={} completed={} cancelled={} overdue={} due_today={} open_high_priority={}",
        stats.total,
        stats.pending,
        stats.in_progress,
        stats.completed,
        stats.cancelled,
        stats.overdue,
        stats.due_today,
        stats.open_high_priority
    )
}

#[cfg(test)]
mod tests {
    use super::{contact_line, todo_stats_json};
    use chrono::Utc;
    use recondesk_core::service::todo_service::TodoStats;
    use recondesk_core::{Contact, ContactDraft};

    #[test]
    fn contact_line_formats_ten_digit_phone() {
        let contact = Contact::from_draft(
            ContactDraft {
                name: "Dana".to_string(),
                phone: "555.123.4567".to_string(),
                ..ContactDraft::default()
            },
            Utc::now(),
        );
        let line = contact_line(&contact);
        assert!(line.contains("(555) 123-4567"));
        assert!(line.contains("[other]"));
    }

    #[test]
    fn todo_stats_json_uses_camel_case_keys() {
        let stats = TodoStats {
            total: 3,
            due_today: 1,
            ..TodoStats::default()
        };
        let value = todo_stats_json(&stats);
        assert_eq!(value["total"], 3);
        assert_eq!(value["dueToday"], 1);
    }
}
