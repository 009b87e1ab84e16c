//! Contact domain model.
//!
//! # Invariants
//! - `name` and `phone` are never blank.
//! - `email`, when present, has a `local@domain.tld` shape.
//! - Contacts are hard-deleted; there is no tombstone state.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ContactId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Closed set of vendor/partner categories used by reconditioning.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ContactCategory {
    Mechanic,
    BodyShop,
    Detailer,
    Glass,
    Tires,
    Upholstery,
    PartsSupplier,
    Transport,
    #[default]
    Other,
}

impl ContactCategory {
    pub const ALL: [ContactCategory; 9] = [
        Self::Mechanic,
        Self::BodyShop,
        Self::Detailer,
        Self::Glass,
        Self::Tires,
        Self::Upholstery,
        Self::PartsSupplier,
        Self::Transport,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mechanic => "mechanic",
            Self::BodyShop => "body-shop",
            Self::Detailer => "detailer",
            Self::Glass => "glass",
            Self::Tires => "tires",
            Self::Upholstery => "upholstery",
            Self::PartsSupplier => "parts-supplier",
            Self::Transport => "transport",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    BlankName,
    BlankPhone,
    InvalidEmail(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "contact name is required"),
            Self::BlankPhone => write!(f, "contact phone is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for ContactValidationError {}

/// Vendor or partner reachable by phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub category: ContactCategory,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contacted: Option<DateTime<Utc>>,
}

/// Form input for a new contact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: ContactCategory,
    pub specialties: Vec<String>,
    pub notes: String,
}

impl Contact {
    /// Builds an active, non-favorite contact stamped at `now`.
    pub fn from_draft(draft: ContactDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            company: non_blank(draft.company),
            title: non_blank(draft.title),
            email: non_blank(draft.email),
            address: non_blank(draft.address),
            category: draft.category,
            specialties: draft
                .specialties
                .into_iter()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
            notes: draft.notes,
            is_favorite: false,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_contacted: None,
        }
    }

    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::BlankName);
        }
        if self.phone.trim().is_empty() {
            return Err(ContactValidationError::BlankPhone);
        }
        if let Some(email) = self.email.as_deref() {
            if !EMAIL_RE.is_match(email.trim()) {
                return Err(ContactValidationError::InvalidEmail(email.to_string()));
            }
        }
        Ok(())
    }

    /// Fields matched by free-text search.
    pub(crate) fn search_fields(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.name.as_str()),
            self.company.as_deref(),
            self.title.as_deref(),
            Some(self.phone.as_str()),
            self.email.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(self.specialties.iter().map(String::as_str))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactCategory, ContactDraft, ContactValidationError};
    use chrono::Utc;

    fn draft() -> ContactDraft {
        ContactDraft {
            name: " Dale's Detailing ".to_string(),
            phone: "5551234567".to_string(),
            company: Some("  ".to_string()),
            specialties: vec!["ceramic".to_string(), " ".to_string()],
            category: ContactCategory::Detailer,
            ..ContactDraft::default()
        }
    }

    #[test]
    fn from_draft_trims_and_drops_blank_optionals() {
        let contact = Contact::from_draft(draft(), Utc::now());
        assert_eq!(contact.name, "Dale's Detailing");
        assert_eq!(contact.company, None);
        assert_eq!(contact.specialties, vec!["ceramic".to_string()]);
        assert!(contact.is_active);
        assert!(!contact.is_favorite);
        assert_eq!(contact.created_at, contact.updated_at);
    }

    #[test]
    fn validate_requires_name_phone_and_email_shape() {
        let mut contact = Contact::from_draft(draft(), Utc::now());
        contact.validate().unwrap();

        contact.email = Some("dale@example".to_string());
        assert!(matches!(
            contact.validate().unwrap_err(),
            ContactValidationError::InvalidEmail(_)
        ));

        contact.email = None;
        contact.phone = " ".to_string();
        assert_eq!(
            contact.validate().unwrap_err(),
            ContactValidationError::BlankPhone
        );
    }

    #[test]
    fn category_parse_is_case_insensitive_and_covers_all_values() {
        assert_eq!(ContactCategory::ALL.len(), 9);
        assert_eq!(
            ContactCategory::parse("Body-Shop"),
            Some(ContactCategory::BodyShop)
        );
        assert_eq!(ContactCategory::parse("florist"), None);
    }

    #[test]
    fn serialization_uses_camel_case_fields() {
        let contact = Contact::from_draft(draft(), Utc::now());
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["isFavorite"], false);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["category"], "detailer");
        assert!(json.get("lastContacted").is_none());
    }
}
