//! Error type for `strata-store-sqlite`.

use thiserror::Error;

use strata_core::dataset::LocationId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] strata_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("a dataset named {0:?} already exists")]
  DuplicateDataset(String),

  #[error("dataset not found: {0}")]
  DatasetNotFound(String),

  /// Inserting a data row whose URI is already registered.
  #[error("a data item with uri {0:?} already exists")]
  DuplicateUri(String),

  #[error("data not found: {0}")]
  DataNotFound(String),

  #[error("location not found: {0}")]
  LocationNotFound(LocationId),

  #[error("unrecognized storage kind: {0:?}")]
  UnknownStorageKind(String),

  /// The requested annotation keys exist on no location and no data item.
  #[error("none of the requested annotation keys exist in the dataset")]
  NoMatchingAnnotations,

  #[error("a query accepts either an annotation filter or a location filter, not both")]
  AmbiguousQuery,

  #[error("tuple and group queries need at least one annotation set")]
  EmptyQuery,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
