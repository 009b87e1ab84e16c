//! Core domain logic for the dealership reconditioning desk.
//! Contacts, todos, calendar, admin dashboard and outbound integrations.

pub mod clock;
pub mod config;
pub mod db;
pub mod format;
pub mod integrations;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use format::format_phone;
pub use logging::{default_log_level, init_logging, logging_status, parse_level, LoggingError};
pub use model::contact::{Contact, ContactCategory, ContactDraft, ContactId};
pub use model::tenant::{TenantId, TenantIdError};
pub use model::todo::{Todo, TodoCategory, TodoDraft, TodoId, TodoPriority, TodoStatus};
pub use repo::slot_repo::{RepoError, RepoResult, SlotRepository, SqliteSlotRepository};
pub use service::calendar_service::CalendarService;
pub use service::contact_service::{ContactService, ContactServiceError};
pub use service::dashboard_service::{DashboardService, DashboardServiceError};
pub use service::settings_service::SettingsService;
pub use service::todo_service::{TodoService, TodoServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
