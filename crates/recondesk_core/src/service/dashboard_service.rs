//! Super-admin dashboard: dealership registry and cross-tenant overview.
//!
//! # Invariants
//! - Dealership ids are unique in the registry.
//! - The overview reads each tenant's slots independently; a tenant with
//!   data but no registry entry is reported as unregistered.

use crate::clock::{Clock, SystemClock};
use crate::model::contact::Contact;
use crate::model::dealership::Dealership;
use crate::model::tenant::TenantId;
use crate::model::todo::Todo;
use crate::repo::collection::{load_collection, save_collection};
use crate::repo::slot_repo::{RepoError, SlotKey, SlotRepository, SlotScope};
use crate::service::todo_service::TodoStats;
use log::info;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum DashboardServiceError {
    BlankName,
    DuplicateDealership(TenantId),
    DealershipNotFound(TenantId),
    Repo(RepoError),
}

impl Display for DashboardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "dealership name is required"),
            Self::DuplicateDealership(id) => write!(f, "dealership already registered: {id}"),
            Self::DealershipNotFound(id) => write!(f, "dealership not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DashboardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DashboardServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type DashboardResult<T> = Result<T, DashboardServiceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealershipSummary {
    pub id: TenantId,
    /// `None` for tenants that have data but no registry entry.
    pub name: Option<String>,
    pub is_active: bool,
    pub contacts: usize,
    pub active_contacts: usize,
    pub todos: TodoStats,
}

impl DealershipSummary {
    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminOverview {
    pub dealerships_total: usize,
    pub dealerships_active: usize,
    pub unregistered_tenants: usize,
    pub contacts_total: usize,
    pub todos: TodoStats,
    pub per_dealership: Vec<DealershipSummary>,
}

pub struct DashboardService<R: SlotRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: SlotRepository> DashboardService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: SlotRepository, C: Clock> DashboardService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Adds a dealership to the registry in the reserved system scope.
    ///
    /// # Errors
    /// - `DashboardServiceError::BlankName` when `name` is blank.
    /// - `DashboardServiceError::DuplicateDealership` when `id` is taken.
    pub fn register_dealership(
        &self,
        id: TenantId,
        name: &str,
        location: Option<String>,
    ) -> DashboardResult<Dealership> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardServiceError::BlankName);
        }
        let mut dealerships = self.load()?;
        if dealerships.iter().any(|dealership| dealership.id == id) {
            return Err(DashboardServiceError::DuplicateDealership(id));
        }

        let dealership = Dealership {
            id,
            name: name.to_string(),
            location: location
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            is_active: true,
            created_at: self.clock.now_utc(),
        };
        dealerships.push(dealership.clone());
        self.save(&dealerships)?;
        info!(
            "event=dealership_register module=dashboard status=ok tenant={}",
            dealership.id
        );
        Ok(dealership)
    }

    /// Registered dealerships sorted by name.
    pub fn list_dealerships(&self) -> DashboardResult<Vec<Dealership>> {
        let mut dealerships = self.load()?;
        dealerships.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(dealerships)
    }

    pub fn set_dealership_active(
        &self,
        id: &TenantId,
        is_active: bool,
    ) -> DashboardResult<Dealership> {
        let mut dealerships = self.load()?;
        let dealership = dealerships
            .iter_mut()
            .find(|dealership| &dealership.id == id)
            .ok_or_else(|| DashboardServiceError::DealershipNotFound(id.clone()))?;
        dealership.is_active = is_active;
        let updated = dealership.clone();
        self.save(&dealerships)?;
        Ok(updated)
    }

    /// Cross-tenant counts for the super-admin landing page.
    pub fn overview(&self) -> DashboardResult<AdminOverview> {
        let now = self.clock.now_local();
        let dealerships = self.load()?;
        let mut tenant_ids = dealerships
            .iter()
            .map(|dealership| dealership.id.clone())
            .collect::<BTreeSet<_>>();
        tenant_ids.extend(self.repo.list_tenants()?);

        let mut overview = AdminOverview {
            dealerships_total: dealerships.len(),
            dealerships_active: dealerships.iter().filter(|d| d.is_active).count(),
            ..AdminOverview::default()
        };

        for tenant in tenant_ids {
            let contacts: Vec<Contact> =
                load_collection(&self.repo, (&tenant).into(), SlotKey::Contacts)?;
            let todos: Vec<Todo> = load_collection(&self.repo, (&tenant).into(), SlotKey::Todos)?;
            let registered = dealerships.iter().find(|dealership| dealership.id == tenant);

            let summary = DealershipSummary {
                name: registered.map(|dealership| dealership.name.clone()),
                is_active: registered.map_or(true, |dealership| dealership.is_active),
                contacts: contacts.len(),
                active_contacts: contacts.iter().filter(|c| c.is_active).count(),
                todos: TodoStats::collect(&todos, now),
                id: tenant,
            };

            if !summary.is_registered() {
                overview.unregistered_tenants += 1;
            }
            overview.contacts_total += summary.contacts;
            overview.todos = overview.todos.combine(summary.todos);
            overview.per_dealership.push(summary);
        }

        info!(
            "event=admin_overview module=dashboard status=ok tenants={} unregistered={}",
            overview.per_dealership.len(),
            overview.unregistered_tenants
        );
        Ok(overview)
    }

    fn load(&self) -> DashboardResult<Vec<Dealership>> {
        Ok(load_collection(
            &self.repo,
            SlotScope::System,
            SlotKey::Dealerships,
        )?)
    }

    fn save(&self, dealerships: &[Dealership]) -> DashboardResult<()> {
        Ok(save_collection(
            &self.repo,
            SlotScope::System,
            SlotKey::Dealerships,
            dealerships,
        )?)
    }
}
