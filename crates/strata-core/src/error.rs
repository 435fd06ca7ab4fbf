//! Error types for `strata-core`.

use thiserror::Error;

use crate::dataset::LocationId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("a dataset named {0:?} already exists")]
  DuplicateDataset(String),

  #[error("dataset not found: {0}")]
  DatasetNotFound(String),

  #[error("a data item with uri {0:?} already exists")]
  DuplicateUri(String),

  #[error("data not found: {0}")]
  DataNotFound(String),

  #[error("location not found: {0}")]
  LocationNotFound(LocationId),

  #[error("unrecognized storage kind: {0:?}")]
  UnknownStorageKind(String),

  /// A query asked for annotation keys that no entity in the dataset
  /// carries. Surfaced as an error rather than an empty result so caller
  /// typos are caught early.
  #[error("none of the requested annotation keys exist in the dataset")]
  NoMatchingAnnotations,

  /// Both an annotation filter and a location filter were supplied to a
  /// query that accepts exactly one of the two.
  #[error("a query accepts either an annotation filter or a location filter, not both")]
  AmbiguousQuery,

  /// A tuple or group query was given an empty list of annotation sets.
  #[error("tuple and group queries need at least one annotation set")]
  EmptyQuery,

  #[error("cannot decode {kind:?} annotation value from {text:?}")]
  ValueDecode { kind: String, text: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
