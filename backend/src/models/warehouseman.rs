//! Warehouseman directory entries as served by the remote data store.

use serde::{Deserialize, Serialize};

use crate::models::product::EntityId;

/// A warehouse operator who can be credited with product edits.
///
/// The store also carries a `secretKey` per warehouseman; it is never read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouseman {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub warehouse_id: EntityId,
}
