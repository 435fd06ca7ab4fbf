//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Annotation values are stored as canonical text plus a kind tag. An
//! absent metadata URI is stored as the empty string.

use strata_core::{
  annotation::{AnnotationValue, ValueKind},
  data::{DataInfo, StorageKind},
  dataset::{Dataset, Location, LocationId},
};

use crate::Result;

// ─── Annotation values ───────────────────────────────────────────────────────

/// `(canonical text, kind tag)` as written to an annotation row.
pub fn encode_value(value: &AnnotationValue) -> (String, &'static str) {
  (value.canonical(), value.kind().as_str())
}

pub fn decode_value(kind: &str, text: &str) -> Result<AnnotationValue> {
  let kind = ValueKind::from_tag(kind)?;
  Ok(AnnotationValue::decode(kind, text)?)
}

// ─── Metadata URI ────────────────────────────────────────────────────────────

pub fn encode_metadata_uri(uri: Option<&str>) -> String {
  uri.unwrap_or_default().to_string()
}

pub fn decode_metadata_uri(stored: String) -> Option<String> {
  if stored.is_empty() { None } else { Some(stored) }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `data` row joined with its storage-type name, as read from the store.
#[derive(Debug, Clone)]
pub struct RawData {
  pub location_id:  LocationId,
  pub uri:          String,
  pub kind:         String,
  pub metadata_uri: String,
}

impl RawData {
  pub fn into_data_info(self, dataset: &Dataset) -> Result<DataInfo> {
    let kind = StorageKind::from_name(&self.kind)?;
    Ok(DataInfo {
      uri: self.uri,
      location: Location { dataset: dataset.clone(), id: self.location_id },
      kind,
      metadata_uri: decode_metadata_uri(self.metadata_uri),
    })
  }
}
