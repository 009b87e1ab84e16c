//! Contact manager use-cases.
//!
//! # Responsibility
//! - CRUD over the tenant `contacts` slot.
//! - Favorite toggling, call logging, search, filtering and stats.
//!
//! # Invariants
//! - Every write validates the contact before persisting.
//! - Every write replaces the whole slot (last write wins).

use crate::clock::{Clock, SystemClock};
use crate::model::contact::{
    Contact, ContactCategory, ContactDraft, ContactId, ContactValidationError,
};
use crate::model::tenant::TenantId;
use crate::repo::collection::{load_collection, save_collection};
use crate::repo::slot_repo::{RepoError, SlotKey, SlotRepository};
use crate::service::matches_text;
use chrono::Duration;
use log::info;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECENT_CONTACT_DAYS: i64 = 30;

#[derive(Debug)]
pub enum ContactServiceError {
    Validation(ContactValidationError),
    ContactNotFound(ContactId),
    Repo(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::ContactNotFound(_) => None,
        }
    }
}

impl From<ContactValidationError> for ContactServiceError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ContactResult<T> = Result<T, ContactServiceError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContactSort {
    /// Case-insensitive by name.
    #[default]
    Name,
    /// Case-insensitive by company; contacts without one sort last.
    Company,
    /// Most recently contacted first; never-contacted last.
    RecentlyContacted,
    /// Newest first.
    RecentlyAdded,
}

/// Predicate chain applied by `list_contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    pub search: Option<String>,
    pub category: Option<ContactCategory>,
    pub favorites_only: bool,
    pub include_inactive: bool,
    pub sort: ContactSort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactStats {
    pub total: usize,
    pub active: usize,
    pub favorites: usize,
    pub contacted_last_30_days: usize,
    pub by_category: BTreeMap<ContactCategory, usize>,
}

pub struct ContactService<R: SlotRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: SlotRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: SlotRepository, C: Clock> ContactService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Stores a new contact built from `draft` with a fresh id.
    ///
    /// # Side effects
    /// - Rewrites the tenant's `contacts` slot.
    /// - Emits a `contact_create` logging event.
    ///
    /// # Errors
    /// - `ContactServiceError::Validation` when name or phone is blank, or the
    ///   email is malformed.
    /// - `ContactServiceError::Repo` when storage fails or holds malformed data.
    pub fn create_contact(&self, tenant: &TenantId, draft: ContactDraft) -> ContactResult<Contact> {
        let contact = Contact::from_draft(draft, self.clock.now_utc());
        contact.validate()?;

        let mut contacts = self.load(tenant)?;
        contacts.push(contact.clone());
        self.save(tenant, &contacts)?;

        info!(
            "event=contact_create module=contacts status=ok tenant={} contact_id={}",
            tenant, contact.id
        );
        Ok(contact)
    }

    /// Replaces a stored contact. `created_at` is kept from storage.
    ///
    /// # Errors
    /// - `ContactServiceError::Validation` for an invalid record.
    /// - `ContactServiceError::ContactNotFound` when no contact has that id.
    pub fn update_contact(&self, tenant: &TenantId, contact: Contact) -> ContactResult<Contact> {
        contact.validate()?;
        let now = self.clock.now_utc();
        self.mutate(tenant, contact.id, move |stored| {
            let created_at = stored.created_at;
            *stored = contact;
            stored.created_at = created_at;
            stored.updated_at = now;
        })
    }

    /// # Errors
    /// - `ContactServiceError::ContactNotFound` when no contact has that id.
    pub fn delete_contact(&self, tenant: &TenantId, id: ContactId) -> ContactResult<()> {
        let mut contacts = self.load(tenant)?;
        let before = contacts.len();
        contacts.retain(|contact| contact.id != id);
        if contacts.len() == before {
            return Err(ContactServiceError::ContactNotFound(id));
        }
        self.save(tenant, &contacts)?;
        info!(
            "event=contact_delete module=contacts status=ok tenant={} contact_id={}",
            tenant, id
        );
        Ok(())
    }

    pub fn get_contact(&self, tenant: &TenantId, id: ContactId) -> ContactResult<Option<Contact>> {
        Ok(self
            .load(tenant)?
            .into_iter()
            .find(|contact| contact.id == id))
    }

    pub fn list_contacts(
        &self,
        tenant: &TenantId,
        query: &ContactQuery,
    ) -> ContactResult<Vec<Contact>> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);

        let mut contacts = self
            .load(tenant)?
            .into_iter()
            .filter(|contact| query.include_inactive || contact.is_active)
            .filter(|contact| !query.favorites_only || contact.is_favorite)
            .filter(|contact| {
                query
                    .category
                    .map_or(true, |category| contact.category == category)
            })
            .filter(|contact| {
                needle
                    .as_deref()
                    .map_or(true, |needle| matches_text(contact.search_fields(), needle))
            })
            .collect::<Vec<_>>();

        contacts.sort_by(|a, b| compare_contacts(a, b, query.sort));
        Ok(contacts)
    }

    /// Case-insensitive search over name, company, title, phone, email and
    /// specialties, inactive contacts included. Blank text returns every
    /// contact, sorted by name.
    pub fn search_contacts(&self, tenant: &TenantId, text: &str) -> ContactResult<Vec<Contact>> {
        self.list_contacts(
            tenant,
            &ContactQuery {
                search: Some(text.to_string()),
                include_inactive: true,
                ..ContactQuery::default()
            },
        )
    }

    pub fn toggle_favorite(&self, tenant: &TenantId, id: ContactId) -> ContactResult<Contact> {
        let now = self.clock.now_utc();
        self.mutate(tenant, id, |contact| {
            contact.is_favorite = !contact.is_favorite;
            contact.updated_at = now;
        })
    }

    pub fn set_active(
        &self,
        tenant: &TenantId,
        id: ContactId,
        is_active: bool,
    ) -> ContactResult<Contact> {
        let now = self.clock.now_utc();
        self.mutate(tenant, id, |contact| {
            contact.is_active = is_active;
            contact.updated_at = now;
        })
    }

    /// Stamps `last_contacted` with the current time.
    pub fn record_call(&self, tenant: &TenantId, id: ContactId) -> ContactResult<Contact> {
        let now = self.clock.now_utc();
        let contact = self.mutate(tenant, id, |contact| {
            contact.last_contacted = Some(now);
            contact.updated_at = now;
        })?;
        info!(
            "event=contact_call_logged module=contacts status=ok tenant={} contact_id={}",
            tenant, id
        );
        Ok(contact)
    }

    pub fn contact_stats(&self, tenant: &TenantId) -> ContactResult<ContactStats> {
        let contacts = self.load(tenant)?;
        let recent_cutoff = self.clock.now_utc() - Duration::days(RECENT_CONTACT_DAYS);

        let mut stats = ContactStats {
            total: contacts.len(),
            ..ContactStats::default()
        };
        for contact in &contacts {
            if contact.is_active {
                stats.active += 1;
            }
            if contact.is_favorite {
                stats.favorites += 1;
            }
            if contact
                .last_contacted
                .is_some_and(|at| at >= recent_cutoff)
            {
                stats.contacted_last_30_days += 1;
            }
            *stats.by_category.entry(contact.category).or_default() += 1;
        }
        Ok(stats)
    }

    fn mutate(
        &self,
        tenant: &TenantId,
        id: ContactId,
        apply: impl FnOnce(&mut Contact),
    ) -> ContactResult<Contact> {
        let mut contacts = self.load(tenant)?;
        let contact = contacts
            .iter_mut()
            .find(|contact| contact.id == id)
            .ok_or(ContactServiceError::ContactNotFound(id))?;
        apply(contact);
        contact.validate()?;
        let updated = contact.clone();
        self.save(tenant, &contacts)?;
        Ok(updated)
    }

    fn load(&self, tenant: &TenantId) -> ContactResult<Vec<Contact>> {
        Ok(load_collection(&self.repo, tenant.into(), SlotKey::Contacts)?)
    }

    fn save(&self, tenant: &TenantId, contacts: &[Contact]) -> ContactResult<()> {
        Ok(save_collection(
            &self.repo,
            tenant.into(),
            SlotKey::Contacts,
            contacts,
        )?)
    }
}

fn compare_contacts(a: &Contact, b: &Contact, sort: ContactSort) -> Ordering {
    let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
    match sort {
        ContactSort::Name => by_name(),
        ContactSort::Company => match (&a.company, &b.company) {
            (Some(left), Some(right)) => left.to_lowercase().cmp(&right.to_lowercase()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(by_name),
        ContactSort::RecentlyContacted => match (a.last_contacted, b.last_contacted) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(by_name),
        ContactSort::RecentlyAdded => b.created_at.cmp(&a.created_at).then_with(by_name),
    }
}
