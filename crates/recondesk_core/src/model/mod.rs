//! Domain records persisted in tenant storage slots.
//!
//! # Responsibility
//! - Define contact, todo, calendar, dealership and settings shapes.
//! - Keep the JSON field naming stable (camelCase, kebab-case enums).
//!
//! # Invariants
//! - Every record is scoped by a `TenantId`; no cross-tenant references.
//! - No referential integrity between records (todo → vehicle, etc).

pub mod calendar;
pub mod contact;
pub mod dealership;
pub mod settings;
pub mod tenant;
pub mod todo;
