//! The `DataIndex` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `strata-store-sqlite`). Callers depend on this abstraction, not on any
//! concrete backend.

use std::collections::BTreeMap;
use std::future::Future;

use crate::{
  annotation::{AnnotationMap, AnnotationValue},
  data::DataInfo,
  dataset::{Dataset, Location},
  table::Table,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Where a new data item is placed: an existing location, or a dataset in
/// which a fresh location is minted as a side effect.
#[derive(Debug, Clone)]
pub enum DataTarget {
  Dataset(Dataset),
  Location(Location),
}

impl From<Dataset> for DataTarget {
  fn from(d: Dataset) -> Self { Self::Dataset(d) }
}

impl From<Location> for DataTarget {
  fn from(l: Location) -> Self { Self::Location(l) }
}

/// Parameters for [`DataIndex::query_data`].
///
/// The two filters are mutually exclusive: supplying both is an
/// `AmbiguousQuery` error. Supplying neither returns every data item in
/// the dataset.
#[derive(Debug, Clone, Default)]
pub struct DataQuery {
  /// Keep only data whose annotation set (combined with its location's) is
  /// a superset of this mapping.
  pub annotations: Option<AnnotationMap>,
  /// Keep only data placed at one of these locations.
  pub locations:   Option<Vec<Location>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Strata index backend.
///
/// Every write commits before its future resolves; there is no cross-call
/// transactional batching. Methods take `&mut self` because the backend
/// performs no internal locking — concurrent callers must serialize access
/// themselves.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait DataIndex {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Datasets ──────────────────────────────────────────────────────────

  /// Create a dataset directory, its description file and its index
  /// schema. Fails with `DuplicateDataset` if the name is taken.
  fn new_dataset<'a>(
    &'a mut self,
    name: &'a str,
  ) -> impl Future<Output = Result<Dataset, Self::Error>> + Send + 'a;

  /// Look up an existing dataset by its workspace-relative URI.
  fn get_dataset<'a>(
    &'a mut self,
    uri: &'a str,
  ) -> impl Future<Output = Result<Dataset, Self::Error>> + Send + 'a;

  /// URIs of every dataset in the workspace.
  fn datasets(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Write the dataset's free-form JSON description document.
  fn set_description<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    description: &'a serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_description<'a>(
    &'a mut self,
    dataset: &'a Dataset,
  ) -> impl Future<Output = Result<serde_json::Value, Self::Error>> + Send + 'a;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Mint a new location, optionally annotating it in the same call.
  fn new_location<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    annotations: Option<&'a AnnotationMap>,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + 'a;

  fn annotate_location<'a>(
    &'a mut self,
    location: &'a Location,
    key: &'a str,
    value: &'a AnnotationValue,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Annotate a data item. Fails with the data-not-found error if the URI
  /// is unknown.
  fn annotate_data<'a>(
    &'a mut self,
    data: &'a DataInfo,
    key: &'a str,
    value: &'a AnnotationValue,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Register a data item. `kind` must name a recognized storage kind.
  /// Fails with `DuplicateUri` if the URI is already registered.
  fn create_data<'a>(
    &'a mut self,
    target: &'a DataTarget,
    uri: &'a str,
    kind: &'a str,
    annotations: Option<&'a AnnotationMap>,
    metadata_uri: Option<&'a str>,
  ) -> impl Future<Output = Result<DataInfo, Self::Error>> + Send + 'a;

  /// Look up a single data item by URI.
  fn get_data<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    uri: &'a str,
  ) -> impl Future<Output = Result<DataInfo, Self::Error>> + Send + 'a;

  /// Delete a data item and all of its annotations, atomically.
  fn delete_data<'a>(
    &'a mut self,
    data: &'a DataInfo,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Queries ───────────────────────────────────────────────────────────

  /// Superset query over data (see [`DataQuery`] for filter semantics).
  fn query_data<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    query: &'a DataQuery,
  ) -> impl Future<Output = Result<Vec<DataInfo>, Self::Error>> + Send + 'a;

  /// Run one superset query per annotation set and inner-join the results
  /// on their shared location: each returned row holds, in input order,
  /// one match per set, all at the same location.
  fn query_data_tuples<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    annotations: &'a [AnnotationMap],
  ) -> impl Future<Output = Result<Vec<Vec<DataInfo>>, Self::Error>> + Send + 'a;

  /// Run one superset query per annotation set and return the result sets
  /// unjoined, in input order.
  fn query_data_groups<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    annotations: &'a [AnnotationMap],
  ) -> impl Future<Output = Result<Vec<Vec<DataInfo>>, Self::Error>> + Send + 'a;

  /// Superset query over locations. An empty or absent mapping returns
  /// every location.
  fn query_location<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    annotations: Option<&'a AnnotationMap>,
  ) -> impl Future<Output = Result<Vec<Location>, Self::Error>> + Send + 'a;

  // ── Introspection ─────────────────────────────────────────────────────

  /// Every data-annotation key with its distinct values.
  fn list_data_annotation_values<'a>(
    &'a mut self,
    dataset: &'a Dataset,
  ) -> impl Future<
    Output = Result<BTreeMap<String, Vec<AnnotationValue>>, Self::Error>,
  > + Send
  + 'a;

  /// Every location-annotation key with its distinct values.
  fn list_location_annotation_values<'a>(
    &'a mut self,
    dataset: &'a Dataset,
  ) -> impl Future<
    Output = Result<BTreeMap<String, Vec<AnnotationValue>>, Self::Error>,
  > + Send
  + 'a;

  /// Pivot view of locations: one row per location, one column per
  /// annotation key.
  fn view_locations<'a>(
    &'a mut self,
    dataset: &'a Dataset,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + 'a;

  /// Pivot view of data, optionally restricted to a set of locations.
  fn view_data<'a>(
    &'a mut self,
    dataset: &'a Dataset,
    locations: Option<&'a [Location]>,
  ) -> impl Future<Output = Result<Table, Self::Error>> + Send + 'a;
}
