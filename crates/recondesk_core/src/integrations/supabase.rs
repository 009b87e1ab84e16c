//! Backend-as-a-service access over Supabase's PostgREST endpoint.
//!
//! # Invariants
//! - Without configuration every call goes to [`NoopBackend`], which returns
//!   empty results and never touches the network.
//! - `update` and `delete` require at least one filter.

use crate::integrations::poller::StatusCheck;
use crate::integrations::upstream_message;
use async_trait::async_trait;
use log::{error, info};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }
}

impl Debug for SupabaseConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Dealerships,
    Users,
    Vehicles,
    Contacts,
    Todos,
    Locations,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Dealerships,
        Table::Users,
        Table::Vehicles,
        Table::Contacts,
        Table::Todos,
        Table::Locations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dealerships => "dealerships",
            Self::Users => "users",
            Self::Vehicles => "vehicles",
            Self::Contacts => "contacts",
            Self::Todos => "todos",
            Self::Locations => "locations",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|table| table.as_str().eq_ignore_ascii_case(value))
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equality filter, rendered as `column=eq.value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    fn query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }
}

#[derive(Debug)]
pub enum BackendError {
    Http(reqwest::Error),
    Api {
        table: Table,
        status: u16,
        message: String,
    },
    MissingFilter(Table),
    /// A 2xx response whose body is not JSON.
    Decode {
        table: Table,
        status: u16,
        source: serde_json::Error,
    },
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) => write!(f, "backend request failed: {err}"),
            Self::Api { message, .. } => write!(f, "{message}"),
            Self::MissingFilter(table) => {
                write!(f, "refusing unfiltered write to table `{table}`")
            }
            Self::Decode {
                table,
                status,
                source,
            } => write!(
                f,
                "unreadable response from table `{table}` (status {status}): {source}"
            ),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
            Self::Api { .. } | Self::MissingFilter(_) => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Row-level access to the hosted backend. Rows are plain JSON objects.
#[async_trait]
pub trait BackendClient: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn select(
        &self,
        table: Table,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> BackendResult<Vec<Value>>;

    /// Returns the inserted rows as stored.
    async fn insert(&self, table: Table, row: &Value) -> BackendResult<Vec<Value>>;

    /// Returns the updated rows.
    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: &Value,
    ) -> BackendResult<Vec<Value>>;

    /// Returns the deleted rows.
    async fn delete(&self, table: Table, filters: &[Filter]) -> BackendResult<Vec<Value>>;
}

/// Stand-in used when no backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

#[async_trait]
impl BackendClient for NoopBackend {
    fn is_configured(&self) -> bool {
        false
    }

    async fn select(&self, _: Table, _: &[Filter], _: Option<usize>) -> BackendResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn insert(&self, _: Table, _: &Value) -> BackendResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn update(&self, _: Table, _: &[Filter], _: &Value) -> BackendResult<Vec<Value>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _: Table, _: &[Filter]) -> BackendResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

/// PostgREST client authenticated with the project's anon key.
pub struct RestBackend {
    http: Client,
    config: SupabaseConfig,
}

impl RestBackend {
    pub fn new(config: SupabaseConfig) -> BackendResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.config.url, table.as_str())
    }

    fn filtered(&self, request: RequestBuilder, filters: &[Filter]) -> RequestBuilder {
        let pairs = filters.iter().map(Filter::query_pair).collect::<Vec<_>>();
        request.query(&pairs)
    }

    async fn send(
        &self,
        operation: &'static str,
        table: Table,
        request: RequestBuilder,
    ) -> BackendResult<Vec<Value>> {
        let response = request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "event=backend_call module=backend status=error op={} table={} http_status={}",
                operation,
                table,
                status.as_u16()
            );
            return Err(BackendError::Api {
                table,
                status: status.as_u16(),
                message: upstream_message(status.as_u16(), &body),
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => rows,
            Ok(Value::Null) => Vec::new(),
            Ok(row) => vec![row],
            Err(source) => {
                error!(
                    "event=backend_call module=backend status=error op={} table={} http_status={} error_code=decode_failed",
                    operation,
                    table,
                    status.as_u16()
                );
                return Err(BackendError::Decode {
                    table,
                    status: status.as_u16(),
                    source,
                });
            }
        };
        info!(
            "event=backend_call module=backend status=ok op={} table={} rows={}",
            operation,
            table,
            rows.len()
        );
        Ok(rows)
    }
}

#[async_trait]
impl BackendClient for RestBackend {
    fn is_configured(&self) -> bool {
        true
    }

    async fn select(
        &self,
        table: Table,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> BackendResult<Vec<Value>> {
        let mut request = self
            .filtered(self.http.get(self.table_url(table)), filters)
            .query(&[("select", "*")]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        self.send("select", table, request).await
    }

    async fn insert(&self, table: Table, row: &Value) -> BackendResult<Vec<Value>> {
        let request = self.http.post(self.table_url(table)).json(row);
        self.send("insert", table, request).await
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: &Value,
    ) -> BackendResult<Vec<Value>> {
        if filters.is_empty() {
            return Err(BackendError::MissingFilter(table));
        }
        let request = self
            .filtered(self.http.patch(self.table_url(table)), filters)
            .json(patch);
        self.send("update", table, request).await
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> BackendResult<Vec<Value>> {
        if filters.is_empty() {
            return Err(BackendError::MissingFilter(table));
        }
        let request = self.filtered(self.http.delete(self.table_url(table)), filters);
        self.send("delete", table, request).await
    }
}

/// Picks the REST backend when configured, the no-op backend otherwise.
pub fn connect_backend(config: Option<SupabaseConfig>) -> BackendResult<Box<dyn BackendClient>> {
    match config {
        Some(config) => {
            info!(
                "event=backend_connect module=backend status=ok mode=rest url={}",
                config.url
            );
            Ok(Box::new(RestBackend::new(config)?))
        }
        None => {
            info!("event=backend_connect module=backend status=ok mode=noop");
            Ok(Box::new(NoopBackend))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendHealth {
    NotConfigured,
    Reachable,
}

/// Pollable reachability check: selects one dealership row.
pub struct BackendHealthCheck {
    backend: Arc<dyn BackendClient>,
}

impl BackendHealthCheck {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl StatusCheck for BackendHealthCheck {
    type Output = BackendHealth;

    fn name(&self) -> &'static str {
        "backend"
    }

    async fn check(&self) -> Result<BackendHealth, String> {
        if !self.backend.is_configured() {
            return Ok(BackendHealth::NotConfigured);
        }
        self.backend
            .select(Table::Dealerships, &[], Some(1))
            .await
            .map(|_| BackendHealth::Reachable)
            .map_err(|err| err.to_string())
    }
}
