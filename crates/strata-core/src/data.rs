//! Data items — uniquely-URI-identified payload references placed at a
//! location.
//!
//! The index never interprets payload bytes. A data row carries only its
//! URI, the storage kind that tells the payload store how to address it,
//! and an optional opaque metadata-document reference.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, dataset::Location};

// ─── Storage kinds ───────────────────────────────────────────────────────────

/// The closed set of recognized payload kinds. Resolving any other name is
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
  Image,
  Tensor,
  Table,
  Value,
  Label,
}

impl StorageKind {
  /// Every recognized kind, in the order the lookup table is seeded.
  pub const ALL: [StorageKind; 5] = [
    Self::Image,
    Self::Tensor,
    Self::Table,
    Self::Value,
    Self::Label,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Image => "image",
      Self::Tensor => "tensor",
      Self::Table => "table",
      Self::Value => "value",
      Self::Label => "label",
    }
  }

  pub fn from_name(name: &str) -> Result<Self> {
    match name {
      "image" => Ok(Self::Image),
      "tensor" => Ok(Self::Tensor),
      "table" => Ok(Self::Table),
      "value" => Ok(Self::Value),
      "label" => Ok(Self::Label),
      other => Err(Error::UnknownStorageKind(other.to_string())),
    }
  }
}

// ─── Data info ───────────────────────────────────────────────────────────────

/// Everything the index knows about one data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataInfo {
  /// Caller-supplied, unique within the dataset.
  pub uri:          String,
  pub location:     Location,
  pub kind:         StorageKind,
  /// Opaque reference into the external metadata-document store.
  pub metadata_uri: Option<String>,
}
