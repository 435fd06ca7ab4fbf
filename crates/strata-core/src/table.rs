//! A small column-aligned table for the human-facing pivot views.
//!
//! Cells are `Option<String>`: `None` is the explicit "no value" marker for
//! an (entity, key) combination that has no annotation. The alignment code
//! in the view builder relies on this instead of padding with empty strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A denormalized, read-only table: named columns, rows of optional cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
  columns: Vec<String>,
  rows:    Vec<Vec<Option<String>>>,
}

impl Table {
  pub fn new(columns: Vec<String>) -> Self {
    Self { columns, rows: Vec::new() }
  }

  /// Append a row. Short rows are padded with `None`; long rows are
  /// truncated to the column count.
  pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
    cells.resize(self.columns.len(), None);
    self.rows.push(cells);
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<Option<String>>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  /// Cell lookup by row index and column name. Returns `None` for an
  /// unknown column, an out-of-range row, or an absent cell.
  pub fn get(&self, row: usize, column: &str) -> Option<&str> {
    let col = self.column_index(column)?;
    self.rows.get(row)?.get(col)?.as_deref()
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut widths: Vec<usize> =
      self.columns.iter().map(String::len).collect();
    for row in &self.rows {
      for (i, cell) in row.iter().enumerate() {
        if let Some(text) = cell {
          widths[i] = widths[i].max(text.len());
        }
      }
    }

    for (i, name) in self.columns.iter().enumerate() {
      if i > 0 {
        write!(f, "  ")?;
      }
      write!(f, "{name:<width$}", width = widths[i])?;
    }
    writeln!(f)?;

    for row in &self.rows {
      for (i, cell) in row.iter().enumerate() {
        if i > 0 {
          write!(f, "  ")?;
        }
        let text = cell.as_deref().unwrap_or("-");
        write!(f, "{text:<width$}", width = widths[i])?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}
