//! The annotation predicate compiler.
//!
//! Compiles an annotation mapping into a row-level boolean SQL fragment of
//! the shape
//!
//! ```text
//! (key_id = (SELECT id FROM annotation_key WHERE name = ?)
//!    AND value = ? AND kind = ?) OR (...) OR ...
//! ```
//!
//! evaluated inside an annotation-table scan. The fragment is an OR, not
//! an AND: conjunction is achieved one level up by grouping matching rows
//! per entity, counting them, and keeping entities whose count equals the
//! number of requested pairs. One scan thereby satisfies an
//! arbitrary-sized AND without generating a join per key.
//!
//! The fragment is parameterized; key names and values never appear in the
//! SQL text.

use strata_core::annotation::AnnotationMap;

const PAIR_CLAUSE: &str = "(key_id = (SELECT id FROM annotation_key \
                           WHERE name = ?) AND value = ? AND kind = ?)";

/// A compiled annotation filter: SQL fragment plus its bound parameters.
#[derive(Debug, Clone)]
pub struct AnnotationPredicate {
  clause: String,
  params: Vec<String>,
  pairs:  usize,
}

impl AnnotationPredicate {
  /// Compile a non-empty mapping. Callers short-circuit the empty mapping
  /// to "match every entity" before reaching the compiler, so an empty
  /// input never produces a vacuous fragment.
  pub fn compile(annotations: &AnnotationMap) -> Self {
    debug_assert!(!annotations.is_empty(), "empty mapping is short-circuited by callers");

    let clause = vec![PAIR_CLAUSE; annotations.len()].join(" OR ");
    let mut params = Vec::with_capacity(annotations.len() * 3);
    for (key, value) in annotations {
      params.push(key.clone());
      params.push(value.canonical());
      params.push(value.kind().as_str().to_string());
    }

    Self { clause, params, pairs: annotations.len() }
  }

  /// The boolean fragment, with one `?` triple per requested pair.
  pub fn clause(&self) -> &str { &self.clause }

  /// Bound parameters, in clause order.
  pub fn params(&self) -> &[String] { &self.params }

  /// The match count an entity must reach to satisfy the conjunction.
  pub fn matches_required(&self) -> i64 { self.pairs as i64 }

  /// The requested key names (for presence classification).
  pub fn keys(&self) -> Vec<String> {
    self.params.iter().step_by(3).cloned().collect()
  }
}
