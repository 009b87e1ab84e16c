//! Tenant (dealership) scoping key.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage scope used for records that belong to no single dealership.
pub(crate) const SYSTEM_SCOPE: &str = "__system__";

const MAX_TENANT_ID_CHARS: usize = 64;

/// Validated dealership identifier.
///
/// Trimmed, non-empty, at most 64 characters of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantIdError {
    Empty,
    TooLong(usize),
    InvalidCharacter(char),
    Reserved,
}

impl Display for TenantIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "tenant id must not be blank"),
            Self::TooLong(len) => write!(
                f,
                "tenant id has {len} characters; at most {MAX_TENANT_ID_CHARS} allowed"
            ),
            Self::InvalidCharacter(ch) => write!(f, "tenant id contains invalid character `{ch}`"),
            Self::Reserved => write!(f, "tenant id `{SYSTEM_SCOPE}` is reserved"),
        }
    }
}

impl Error for TenantIdError {}

impl TenantId {
    pub fn parse(value: &str) -> Result<Self, TenantIdError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(TenantIdError::Empty);
        }
        if trimmed == SYSTEM_SCOPE {
            return Err(TenantIdError::Reserved);
        }
        let len = trimmed.chars().count();
        if len > MAX_TENANT_ID_CHARS {
            return Err(TenantIdError::TooLong(len));
        }
        if let Some(ch) = trimmed
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
        {
            return Err(TenantIdError::InvalidCharacter(ch));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}
