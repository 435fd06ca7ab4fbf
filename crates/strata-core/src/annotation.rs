//! Annotation values — typed key/value facts attached to locations and data.
//!
//! Values are persisted as canonical text plus an explicit kind tag, so an
//! integer `1` and the text `"1"` stay distinct facts. Matching is exact on
//! `(key, kind, text)`; there is no numeric coercion — `1` and `1.0` are
//! different annotation values.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An ordered mapping of annotation key name to value. Order is part of the
/// public contract only insofar as queries and views are deterministic.
pub type AnnotationMap = BTreeMap<String, AnnotationValue>;

// ─── Kind tag ────────────────────────────────────────────────────────────────

/// The logical type of an annotation value, stored next to its text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
  Text,
  Integer,
  Real,
  Boolean,
}

impl ValueKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Text => "text",
      Self::Integer => "integer",
      Self::Real => "real",
      Self::Boolean => "boolean",
    }
  }

  pub fn from_tag(tag: &str) -> Result<Self> {
    match tag {
      "text" => Ok(Self::Text),
      "integer" => Ok(Self::Integer),
      "real" => Ok(Self::Real),
      "boolean" => Ok(Self::Boolean),
      other => Err(Error::ValueDecode {
        kind: other.to_string(),
        text: String::new(),
      }),
    }
  }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single annotation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
  Boolean(bool),
  Integer(i64),
  Real(f64),
  Text(String),
}

impl AnnotationValue {
  pub fn kind(&self) -> ValueKind {
    match self {
      Self::Text(_) => ValueKind::Text,
      Self::Integer(_) => ValueKind::Integer,
      Self::Real(_) => ValueKind::Real,
      Self::Boolean(_) => ValueKind::Boolean,
    }
  }

  /// The canonical text form written to the store.
  pub fn canonical(&self) -> String {
    match self {
      Self::Text(s) => s.clone(),
      Self::Integer(i) => i.to_string(),
      Self::Real(r) => r.to_string(),
      Self::Boolean(b) => b.to_string(),
    }
  }

  /// Rebuild a typed value from its stored `(kind, text)` pair.
  pub fn decode(kind: ValueKind, text: &str) -> Result<Self> {
    let invalid = || Error::ValueDecode {
      kind: kind.as_str().to_string(),
      text: text.to_string(),
    };
    match kind {
      ValueKind::Text => Ok(Self::Text(text.to_string())),
      ValueKind::Integer => text.parse().map(Self::Integer).map_err(|_| invalid()),
      ValueKind::Real => text.parse().map(Self::Real).map_err(|_| invalid()),
      ValueKind::Boolean => text.parse().map(Self::Boolean).map_err(|_| invalid()),
    }
  }
}

impl fmt::Display for AnnotationValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

impl From<&str> for AnnotationValue {
  fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for AnnotationValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for AnnotationValue {
  fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<f64> for AnnotationValue {
  fn from(r: f64) -> Self { Self::Real(r) }
}

impl From<bool> for AnnotationValue {
  fn from(b: bool) -> Self { Self::Boolean(b) }
}
