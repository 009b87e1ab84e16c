//! Slot repository contract and SQLite implementation.

use crate::db::DbError;
use crate::model::tenant::{TenantId, SYSTEM_SCOPE};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored payload could not be decoded.
    InvalidData {
        scope: String,
        key: &'static str,
        message: String,
    },
    /// In-memory value could not be encoded.
    Encode(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData {
                scope,
                key,
                message,
            } => write!(f, "invalid stored data in slot `{scope}/{key}`: {message}"),
            Self::Encode(message) => write!(f, "failed to encode slot payload: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData { .. } | Self::Encode(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Named storage slots. Each holds one JSON document per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKey {
    Contacts,
    Todos,
    CalendarEvents,
    Settings,
    /// Only valid in the system scope.
    Dealerships,
}

impl SlotKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Todos => "todos",
            Self::CalendarEvents => "calendar_events",
            Self::Settings => "settings",
            Self::Dealerships => "dealerships",
        }
    }
}

/// Storage scope: a dealership, or the shared system scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope<'a> {
    Tenant(&'a TenantId),
    System,
}

impl SlotScope<'_> {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tenant(tenant) => tenant.as_str(),
            Self::System => SYSTEM_SCOPE,
        }
    }
}

impl<'a> From<&'a TenantId> for SlotScope<'a> {
    fn from(value: &'a TenantId) -> Self {
        Self::Tenant(value)
    }
}

/// Raw slot access. Payloads are opaque JSON text at this level.
pub trait SlotRepository {
    fn read_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<Option<String>>;
    fn write_slot(&self, scope: SlotScope<'_>, key: SlotKey, payload: &str) -> RepoResult<()>;
    /// Returns whether a slot was removed.
    fn remove_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<bool>;
    /// Dealerships with at least one stored slot, sorted by id.
    fn list_tenants(&self) -> RepoResult<Vec<TenantId>>;
}

impl<R: SlotRepository + ?Sized> SlotRepository for &R {
    fn read_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<Option<String>> {
        (**self).read_slot(scope, key)
    }

    fn write_slot(&self, scope: SlotScope<'_>, key: SlotKey, payload: &str) -> RepoResult<()> {
        (**self).write_slot(scope, key, payload)
    }

    fn remove_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<bool> {
        (**self).remove_slot(scope, key)
    }

    fn list_tenants(&self) -> RepoResult<Vec<TenantId>> {
        (**self).list_tenants()
    }
}

/// SQLite-backed slot repository over the `storage_slots` table.
pub struct SqliteSlotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotRepository<'conn> {
    /// Expects a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SlotRepository for SqliteSlotRepository<'_> {
    fn read_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload
                 FROM storage_slots
                 WHERE tenant_id = ?1 AND slot_key = ?2;",
                params![scope.as_str(), key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_slot(&self, scope: SlotScope<'_>, key: SlotKey, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO storage_slots (tenant_id, slot_key, payload, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT (tenant_id, slot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![scope.as_str(), key.as_str(), payload],
        )?;
        Ok(())
    }

    fn remove_slot(&self, scope: SlotScope<'_>, key: SlotKey) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM storage_slots WHERE tenant_id = ?1 AND slot_key = ?2;",
            params![scope.as_str(), key.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn list_tenants(&self) -> RepoResult<Vec<TenantId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT tenant_id
             FROM storage_slots
             WHERE tenant_id <> ?1
             ORDER BY tenant_id ASC;",
        )?;
        let mut rows = stmt.query([SYSTEM_SCOPE])?;
        let mut tenants = Vec::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let tenant = TenantId::parse(&raw).map_err(|err| RepoError::InvalidData {
                scope: raw.clone(),
                key: "tenant_id",
                message: err.to_string(),
            })?;
            tenants.push(tenant);
        }
        Ok(tenants)
    }
}
