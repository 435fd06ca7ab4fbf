//! The counting-based intersection query engine and the tuple/group
//! composer.
//!
//! "Annotation set is a superset of {k1:v1, …, kn:vn}" is answered in two
//! stages: the compiled predicate matches individual annotation rows (an
//! OR over the requested pairs), and a GROUP BY over the entity id counts
//! how many requested pairs each entity satisfies. Entities reaching a
//! count of `n` carry all requested pairs. An entity annotated with the
//! same key twice under different values can match at most one of the
//! pairs for that key, so duplicate values never inflate the count past
//! `n`.

use std::collections::{BTreeMap, HashMap};

use rusqlite::types::Value;

use strata_core::{
  annotation::{AnnotationMap, AnnotationValue},
  dataset::LocationId,
};

use crate::{
  Error, Result, dataset::DatasetIndex, encode::RawData, encode::decode_value,
  predicate::AnnotationPredicate,
};

/// Which of the two annotation tables an operation runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnnotationTable {
  Location,
  Data,
}

impl AnnotationTable {
  pub(crate) fn table_name(self) -> &'static str {
    match self {
      Self::Location => "location_annotation",
      Self::Data => "data_annotation",
    }
  }

  pub(crate) fn entity_column(self) -> &'static str {
    match self {
      Self::Location => "location_id",
      Self::Data => "data_id",
    }
  }
}

/// Shared projection for every data-returning query.
const SELECT_DATA: &str =
  "SELECT data.location_id, data.uri, storage_type.name, data.metadata_uri
   FROM data
   INNER JOIN storage_type ON storage_type.id = data.type_id";

impl DatasetIndex {
  // ── Intersection queries ──────────────────────────────────────────────────

  /// Locations whose annotation set is a superset of `annotations`.
  /// An empty mapping returns every location.
  pub async fn query_location_ids(
    &self,
    annotations: &AnnotationMap,
  ) -> Result<Vec<LocationId>> {
    if annotations.is_empty() {
      return self
        .select_ids("SELECT id FROM location ORDER BY id".to_string(), vec![])
        .await;
    }

    let pred = AnnotationPredicate::compile(annotations);
    let (on_locations, on_data) = self.annotation_presence(pred.keys()).await?;
    if !on_locations && !on_data {
      return Err(Error::NoMatchingAnnotations);
    }
    if !on_locations {
      // The keys exist, but only on data items; no location can qualify.
      return Ok(Vec::new());
    }

    let sql = format!(
      "WITH location_count AS (
         SELECT location_id, COUNT(1) AS num
         FROM location_annotation
         WHERE ({clause})
         GROUP BY location_id
       )
       SELECT location_id FROM location_count WHERE num = ?
       ORDER BY location_id",
      clause = pred.clause(),
    );
    let mut params = text_params(&pred);
    params.push(Value::Integer(pred.matches_required()));
    self.select_ids(sql, params).await
  }

  /// Data whose combined (own + location) annotation set is a superset of
  /// `annotations`. An empty mapping returns every data item.
  pub async fn query_data_records(
    &self,
    annotations: &AnnotationMap,
  ) -> Result<Vec<RawData>> {
    if annotations.is_empty() {
      let sql = format!("{SELECT_DATA} ORDER BY data.id");
      return self.select_data_records(sql, vec![]).await;
    }

    let pred = AnnotationPredicate::compile(annotations);
    match self.annotation_presence(pred.keys()).await? {
      (false, false) => Err(Error::NoMatchingAnnotations),
      (true, false) => self.data_matching_location_side(&pred).await,
      (false, true) => self.data_matching_data_side(&pred).await,
      (true, true) => self.data_matching_both_sides(&pred).await,
    }
  }

  /// Data placed at any of the given locations. An empty id list matches
  /// nothing.
  pub async fn query_data_at(
    &self,
    location_ids: &[LocationId],
  ) -> Result<Vec<RawData>> {
    if location_ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; location_ids.len()].join(", ");
    let sql = format!(
      "{SELECT_DATA} WHERE data.location_id IN ({placeholders}) ORDER BY data.id"
    );
    let params = location_ids.iter().map(|id| Value::Integer(*id)).collect();
    self.select_data_records(sql, params).await
  }

  // ── Tuple / group composition ─────────────────────────────────────────────

  /// One intersection query per annotation set, inner-joined pairwise on
  /// the shared location id. Several matches at one location multiply
  /// combinatorially, as in a relational join.
  pub async fn query_data_tuples(
    &self,
    sets: &[AnnotationMap],
  ) -> Result<Vec<Vec<RawData>>> {
    let Some(first) = sets.first() else {
      return Err(Error::EmptyQuery);
    };

    let mut rows: Vec<Vec<RawData>> = self
      .query_data_records(first)
      .await?
      .into_iter()
      .map(|record| vec![record])
      .collect();

    for set in &sets[1..] {
      let mut by_location: HashMap<LocationId, Vec<RawData>> = HashMap::new();
      for record in self.query_data_records(set).await? {
        by_location.entry(record.location_id).or_default().push(record);
      }

      let mut joined = Vec::new();
      for row in rows {
        if let Some(partners) = by_location.get(&row[0].location_id) {
          for partner in partners {
            let mut extended = row.clone();
            extended.push(partner.clone());
            joined.push(extended);
          }
        }
      }
      rows = joined;
    }

    Ok(rows)
  }

  /// One intersection query per annotation set, result sets kept apart.
  pub async fn query_data_groups(
    &self,
    sets: &[AnnotationMap],
  ) -> Result<Vec<Vec<RawData>>> {
    if sets.is_empty() {
      return Err(Error::EmptyQuery);
    }
    let mut groups = Vec::with_capacity(sets.len());
    for set in sets {
      groups.push(self.query_data_records(set).await?);
    }
    Ok(groups)
  }

  // ── Key/value introspection ───────────────────────────────────────────────

  /// Every annotation key in `table` with its distinct decoded values.
  pub(crate) async fn annotation_values(
    &self,
    table: AnnotationTable,
  ) -> Result<BTreeMap<String, Vec<AnnotationValue>>> {
    let sql = format!(
      "SELECT DISTINCT k.name, a.value, a.kind
       FROM {table} AS a
       INNER JOIN annotation_key AS k ON k.id = a.key_id
       ORDER BY k.name, a.value",
      table = table.table_name(),
    );

    let rows: Vec<(String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut values: BTreeMap<String, Vec<AnnotationValue>> = BTreeMap::new();
    for (key, text, kind) in rows {
      values
        .entry(key)
        .or_default()
        .push(decode_value(&kind, &text)?);
    }
    Ok(values)
  }

  // ── Engine internals ──────────────────────────────────────────────────────

  /// Classify the requested keys: are they observed among location
  /// annotations, among data annotations, or neither?
  async fn annotation_presence(&self, keys: Vec<String>) -> Result<(bool, bool)> {
    let placeholders = vec!["?"; keys.len()].join(", ");
    let location_sql = format!(
      "SELECT COUNT(1) FROM location_annotation AS a
       INNER JOIN annotation_key AS k ON k.id = a.key_id
       WHERE k.name IN ({placeholders})"
    );
    let data_sql = format!(
      "SELECT COUNT(1) FROM data_annotation AS a
       INNER JOIN annotation_key AS k ON k.id = a.key_id
       WHERE k.name IN ({placeholders})"
    );

    let (on_locations, on_data): (i64, i64) = self
      .conn
      .call(move |conn| {
        let on_locations = conn.query_row(
          &location_sql,
          rusqlite::params_from_iter(keys.iter()),
          |row| row.get(0),
        )?;
        let on_data = conn.query_row(
          &data_sql,
          rusqlite::params_from_iter(keys.iter()),
          |row| row.get(0),
        )?;
        Ok((on_locations, on_data))
      })
      .await?;

    Ok((on_locations > 0, on_data > 0))
  }

  /// All requested keys live on locations: count matching location
  /// annotations per location and keep the locations' data.
  async fn data_matching_location_side(
    &self,
    pred: &AnnotationPredicate,
  ) -> Result<Vec<RawData>> {
    let sql = format!(
      "WITH location_count AS (
         SELECT location_id, COUNT(1) AS loc_num
         FROM location_annotation
         WHERE ({clause})
         GROUP BY location_id
       )
       {SELECT_DATA}
       WHERE data.location_id IN (
         SELECT location_id FROM location_count WHERE loc_num = ?)
       ORDER BY data.id",
      clause = pred.clause(),
    );
    let mut params = text_params(pred);
    params.push(Value::Integer(pred.matches_required()));
    self.select_data_records(sql, params).await
  }

  /// All requested keys live on data items: same counting, keyed by data
  /// id.
  async fn data_matching_data_side(
    &self,
    pred: &AnnotationPredicate,
  ) -> Result<Vec<RawData>> {
    let sql = format!(
      "WITH data_count AS (
         SELECT data_id, COUNT(1) AS data_num
         FROM data_annotation
         WHERE ({clause})
         GROUP BY data_id
       )
       {SELECT_DATA}
       WHERE data.id IN (SELECT data_id FROM data_count WHERE data_num = ?)
       ORDER BY data.id",
      clause = pred.clause(),
    );
    let mut params = text_params(pred);
    params.push(Value::Integer(pred.matches_required()));
    self.select_data_records(sql, params).await
  }

  /// The requested keys are split across both tables: per (location, data)
  /// pair, the location-side and data-side counts must sum to `n`. Either
  /// side may contribute zero, hence the LEFT JOINs.
  async fn data_matching_both_sides(
    &self,
    pred: &AnnotationPredicate,
  ) -> Result<Vec<RawData>> {
    let sql = format!(
      "WITH location_count AS (
         SELECT location_id, COUNT(1) AS loc_num
         FROM location_annotation
         WHERE ({clause})
         GROUP BY location_id
       ),
       data_count AS (
         SELECT data_id, COUNT(1) AS data_num
         FROM data_annotation
         WHERE ({clause})
         GROUP BY data_id
       )
       {SELECT_DATA}
       LEFT JOIN location_count ON location_count.location_id = data.location_id
       LEFT JOIN data_count ON data_count.data_id = data.id
       WHERE COALESCE(loc_num, 0) + COALESCE(data_num, 0) = ?
       ORDER BY data.id",
      clause = pred.clause(),
    );
    let mut params = text_params(pred);
    params.extend(text_params(pred));
    params.push(Value::Integer(pred.matches_required()));
    self.select_data_records(sql, params).await
  }

  async fn select_data_records(
    &self,
    sql: String,
    params: Vec<Value>,
  ) -> Result<Vec<RawData>> {
    let records = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(RawData {
              location_id:  row.get(0)?,
              uri:          row.get(1)?,
              kind:         row.get(2)?,
              metadata_uri: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
      })
      .await?;
    Ok(records)
  }

  async fn select_ids(&self, sql: String, params: Vec<Value>) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }
}

fn text_params(pred: &AnnotationPredicate) -> Vec<Value> {
  pred.params().iter().map(|p| Value::Text(p.clone())).collect()
}
