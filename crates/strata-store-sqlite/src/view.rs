//! The pivot view builder.
//!
//! Pivots the narrow (entity, key, value) annotation rows into a wide
//! table with one column per key: enumerate the distinct keys, read one
//! value column per key, then align the columns by entity id. An entity
//! with no value for a key gets an explicit `None` cell. A key annotated
//! twice on one entity collapses to a single cell (last row read wins) —
//! only one value per (entity, key) is representable in the pivot.

use std::collections::{HashMap, HashSet};

use rusqlite::types::Value;

use strata_core::{
  annotation::AnnotationMap, dataset::LocationId, table::Table,
};

use crate::{Result, dataset::DatasetIndex, query::AnnotationTable};

/// One pivoted annotation table: key columns in first-use order, aligned
/// cell rows keyed by entity id.
struct Pivot {
  columns: Vec<String>,
  cells:   HashMap<i64, Vec<Option<String>>>,
}

impl DatasetIndex {
  /// One row per location, one column per location-annotation key.
  pub async fn view_locations(&self) -> Result<Table> {
    let location_ids = self.query_location_ids(&AnnotationMap::new()).await?;
    let pivot = self.pivot(AnnotationTable::Location, None).await?;

    let mut columns = vec!["location_id".to_string()];
    columns.extend(pivot.columns.iter().cloned());

    let mut table = Table::new(columns);
    for id in location_ids {
      let mut row = vec![Some(id.to_string())];
      if let Some(cells) = pivot.cells.get(&id) {
        row.extend(cells.iter().cloned());
      }
      table.push_row(row);
    }
    Ok(table)
  }

  /// One row per data item — id, location, storage kind — left-joined
  /// with the pivoted location-annotation and data-annotation columns,
  /// optionally restricted to a set of locations.
  pub async fn view_data(
    &self,
    locations: Option<&[LocationId]>,
  ) -> Result<Table> {
    let filter = locations.map(<[LocationId]>::to_vec);

    let base = self.data_view_base(filter.clone()).await?;
    let location_pivot =
      self.pivot(AnnotationTable::Location, filter.clone()).await?;
    let data_pivot = self.pivot(AnnotationTable::Data, filter).await?;

    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for name in ["data_id", "location", "format"] {
      columns.push(unique_column(&mut seen, name));
    }
    for name in location_pivot.columns.iter().chain(&data_pivot.columns) {
      columns.push(unique_column(&mut seen, name));
    }

    let mut table = Table::new(columns);
    for (data_id, location_id, format) in base {
      let mut row = vec![
        Some(data_id.to_string()),
        Some(location_id.to_string()),
        Some(format),
      ];
      row.extend(pivot_cells(&location_pivot, location_id));
      row.extend(pivot_cells(&data_pivot, data_id));
      table.push_row(row);
    }
    Ok(table)
  }

  /// `(data id, location id, storage-kind name)` per data row.
  async fn data_view_base(
    &self,
    locations: Option<Vec<LocationId>>,
  ) -> Result<Vec<(i64, i64, String)>> {
    let (filter_sql, params) = match &locations {
      None => (String::new(), Vec::new()),
      Some(ids) if ids.is_empty() => return Ok(Vec::new()),
      Some(ids) => (
        format!(
          "WHERE data.location_id IN ({})",
          vec!["?"; ids.len()].join(", ")
        ),
        ids.iter().map(|id| Value::Integer(*id)).collect(),
      ),
    };
    let sql = format!(
      "SELECT data.id, data.location_id, storage_type.name
       FROM data
       INNER JOIN storage_type ON storage_type.id = data.type_id
       {filter_sql}
       ORDER BY data.id"
    );

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Build the pivot of one annotation table, optionally restricted to a
  /// set of locations (for the data table, restriction goes through the
  /// owning data rows).
  async fn pivot(
    &self,
    table: AnnotationTable,
    locations: Option<Vec<LocationId>>,
  ) -> Result<Pivot> {
    let table_name = table.table_name();
    let entity = table.entity_column();

    let (filter_sql, filter_params): (String, Vec<Value>) = match &locations {
      None => (String::new(), Vec::new()),
      Some(ids) => {
        let placeholders = vec!["?"; ids.len().max(1)].join(", ");
        let clause = match table {
          AnnotationTable::Location => {
            format!("AND location_id IN ({placeholders})")
          }
          AnnotationTable::Data => format!(
            "AND data_id IN (SELECT id FROM data \
             WHERE location_id IN ({placeholders}))"
          ),
        };
        let params = if ids.is_empty() {
          // An empty restriction matches nothing; bind a single null.
          vec![Value::Null]
        } else {
          ids.iter().map(|id| Value::Integer(*id)).collect()
        };
        (clause, params)
      }
    };

    let pivot = self
      .conn
      .call(move |conn| {
        let keys: Vec<(i64, String)> = {
          let sql = format!(
            "SELECT DISTINCT a.key_id, k.name
             FROM {table_name} AS a
             INNER JOIN annotation_key AS k ON k.id = a.key_id
             ORDER BY a.key_id"
          );
          let mut stmt = conn.prepare(&sql)?;
          let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          keys
        };

        let mut columns = Vec::with_capacity(keys.len());
        let mut cells: HashMap<i64, Vec<Option<String>>> = HashMap::new();

        for (index, (key_id, name)) in keys.iter().enumerate() {
          columns.push(name.clone());

          let sql = format!(
            "SELECT {entity}, value FROM {table_name}
             WHERE key_id = ? {filter_sql}"
          );
          let mut params = vec![Value::Integer(*key_id)];
          params.extend(filter_params.iter().cloned());

          let mut stmt = conn.prepare(&sql)?;
          let values = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
              Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          for (entity_id, value) in values {
            let row = cells
              .entry(entity_id)
              .or_insert_with(|| vec![None; keys.len()]);
            row[index] = Some(value);
          }
        }

        Ok(Pivot { columns, cells })
      })
      .await?;
    Ok(pivot)
  }
}

fn pivot_cells(pivot: &Pivot, entity_id: i64) -> Vec<Option<String>> {
  pivot
    .cells
    .get(&entity_id)
    .cloned()
    .unwrap_or_else(|| vec![None; pivot.columns.len()])
}

/// Disambiguate repeated column names by positional suffix, as the joined
/// tabular outputs do.
fn unique_column(seen: &mut HashSet<String>, name: &str) -> String {
  let mut candidate = name.to_string();
  let mut suffix = 0;
  while !seen.insert(candidate.clone()) {
    suffix += 1;
    candidate = format!("{name}_{suffix}");
  }
  candidate
}
