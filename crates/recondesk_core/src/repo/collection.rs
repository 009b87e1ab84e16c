//! Typed JSON views over raw slots.

use crate::repo::slot_repo::{RepoError, RepoResult, SlotKey, SlotRepository, SlotScope};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Loads the JSON array stored in a slot. A missing slot is an empty list.
pub fn load_collection<T: DeserializeOwned>(
    repo: &impl SlotRepository,
    scope: SlotScope<'_>,
    key: SlotKey,
) -> RepoResult<Vec<T>> {
    Ok(load_document(repo, scope, key)?.unwrap_or_default())
}

/// Replaces the slot with `items` serialized as a JSON array.
pub fn save_collection<T: Serialize>(
    repo: &impl SlotRepository,
    scope: SlotScope<'_>,
    key: SlotKey,
    items: &[T],
) -> RepoResult<()> {
    save_document(repo, scope, key, items)
}

pub fn load_document<T: DeserializeOwned>(
    repo: &impl SlotRepository,
    scope: SlotScope<'_>,
    key: SlotKey,
) -> RepoResult<Option<T>> {
    let Some(payload) = repo.read_slot(scope, key)? else {
        return Ok(None);
    };
    serde_json::from_str(&payload)
        .map(Some)
        .map_err(|err| RepoError::InvalidData {
            scope: scope.as_str().to_string(),
            key: key.as_str(),
            message: err.to_string(),
        })
}

pub fn save_document<T: Serialize + ?Sized>(
    repo: &impl SlotRepository,
    scope: SlotScope<'_>,
    key: SlotKey,
    value: &T,
) -> RepoResult<()> {
    let payload = serde_json::to_string(value).map_err(|err| RepoError::Encode(err.to_string()))?;
    repo.write_slot(scope, key, &payload)
}
