//! Keyed storage slots and JSON collection helpers.
//!
//! # Responsibility
//! - Persist one JSON document per `(tenant, slot key)`.
//! - Isolate SQLite details from the manager services.
//!
//! # Invariants
//! - Writes replace the whole slot; last write wins.
//! - Malformed persisted JSON is reported as `RepoError::InvalidData`.

pub mod collection;
pub mod slot_repo;
