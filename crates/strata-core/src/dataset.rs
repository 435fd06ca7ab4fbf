//! Dataset and location identities.
//!
//! A dataset is one physical store (a directory with an `index.db`). A
//! location is a grouping point inside a dataset — a bare surrogate id with
//! no intrinsic attributes beyond its annotation set.

use serde::{Deserialize, Serialize};

/// Surrogate key of a location row.
pub type LocationId = i64;

/// Surrogate key of a data row.
pub type DataId = i64;

/// Surrogate key of an interned annotation key.
pub type KeyId = i64;

/// A dataset handle: human-readable name plus the workspace-relative URI
/// that names its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
  pub name: String,
  pub uri:  String,
}

/// A grouping point for data within a dataset.
///
/// Locations are never mutated after creation except through their
/// annotation set, and are only ever deleted transitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub dataset: Dataset,
  pub id:      LocationId,
}
