//! [`LocalIndex`] — the workspace facade: dataset directories on disk plus
//! one cached [`DatasetIndex`] connection per dataset.
//!
//! The cache is plain owned state. A dataset's connection is opened
//! lazily on first access and lives until [`LocalIndex::close`] drains the
//! cache (dropping the facade also releases every connection). There is no
//! internal locking: concurrent callers serialize access themselves.

use std::{
  collections::{BTreeMap, HashMap},
  fs,
  path::PathBuf,
};

use serde::{Deserialize, Serialize};

use strata_core::{
  annotation::{AnnotationMap, AnnotationValue},
  data::DataInfo,
  dataset::{Dataset, Location},
  index::{DataIndex, DataQuery, DataTarget},
  table::Table,
};

use crate::{
  Error, Result, dataset::DatasetIndex, encode::RawData, query::AnnotationTable,
};

const INDEX_FILE: &str = "index.db";
const INFO_FILE: &str = "info.json";
const DESCRIPTION_FILE: &str = "description.json";

/// Shape of a dataset's `info.json`.
#[derive(Debug, Serialize, Deserialize)]
struct DatasetInfo {
  name: String,
}

/// A workspace of datasets rooted at one directory.
pub struct LocalIndex {
  root:    PathBuf,
  handles: HashMap<String, DatasetIndex>,
}

impl LocalIndex {
  /// Open a workspace, creating the root directory if needed.
  pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    fs::create_dir_all(&root)?;
    Ok(Self { root, handles: HashMap::new() })
  }

  pub fn root(&self) -> &std::path::Path { &self.root }

  /// Close every cached connection. Handles are released exactly once;
  /// re-opening a dataset after `close` requires a fresh facade.
  pub async fn close(mut self) -> Result<()> {
    for (uri, handle) in self.handles.drain() {
      handle.close().await?;
      tracing::debug!(dataset = %uri, "closed dataset index");
    }
    Ok(())
  }

  /// The cached connection for `uri`, opened on first access.
  async fn dataset_index(&mut self, uri: &str) -> Result<&DatasetIndex> {
    if !self.handles.contains_key(uri) {
      let dir = self.root.join(uri);
      if !dir.is_dir() {
        return Err(Error::DatasetNotFound(uri.to_owned()));
      }
      let handle = DatasetIndex::open(dir.join(INDEX_FILE)).await?;
      tracing::debug!(dataset = %uri, "opened dataset index");
      self.handles.insert(uri.to_owned(), handle);
    }
    self
      .handles
      .get(uri)
      .ok_or_else(|| Error::DatasetNotFound(uri.to_owned()))
  }

  fn dataset_file(&self, dataset: &Dataset, file: &str) -> PathBuf {
    self.root.join(&dataset.uri).join(file)
  }

  fn into_data_infos(
    records: Vec<RawData>,
    dataset: &Dataset,
  ) -> Result<Vec<DataInfo>> {
    records
      .into_iter()
      .map(|record| record.into_data_info(dataset))
      .collect()
  }
}

/// A dataset URI is its name lower-cased with spaces collapsed to `_`.
fn dataset_uri(name: &str) -> String {
  name.to_lowercase().replace(' ', "_")
}

// ─── DataIndex impl ──────────────────────────────────────────────────────────

impl DataIndex for LocalIndex {
  type Error = Error;

  // ── Datasets ──────────────────────────────────────────────────────────────

  async fn new_dataset(&mut self, name: &str) -> Result<Dataset> {
    let uri = dataset_uri(name);
    let dir = self.root.join(&uri);
    if dir.exists() {
      return Err(Error::DuplicateDataset(name.to_owned()));
    }
    fs::create_dir_all(&dir)?;

    let info = DatasetInfo { name: name.to_owned() };
    let written = fs::write(dir.join(INFO_FILE), serde_json::to_string(&info)?);

    // Schema creation is transactional; if it or the info file fails, take
    // the partially created dataset directory down with it.
    let outcome = match written {
      Ok(()) => DatasetIndex::open(dir.join(INDEX_FILE)).await,
      Err(err) => Err(err.into()),
    };
    match outcome {
      Ok(handle) => {
        self.handles.insert(uri.clone(), handle);
      }
      Err(err) => {
        let _ = fs::remove_dir_all(&dir);
        return Err(err);
      }
    }

    tracing::info!(dataset = %uri, "created dataset");
    Ok(Dataset { name: name.to_owned(), uri })
  }

  async fn get_dataset(&mut self, uri: &str) -> Result<Dataset> {
    let path = self.root.join(uri).join(INFO_FILE);
    if !path.is_file() {
      return Err(Error::DatasetNotFound(uri.to_owned()));
    }
    let info: DatasetInfo = serde_json::from_str(&fs::read_to_string(path)?)?;
    Ok(Dataset { name: info.name, uri: uri.to_owned() })
  }

  async fn datasets(&self) -> Result<Vec<String>> {
    let mut uris = Vec::new();
    for entry in fs::read_dir(&self.root)? {
      let entry = entry?;
      if entry.file_type()?.is_dir() {
        uris.push(entry.file_name().to_string_lossy().into_owned());
      }
    }
    uris.sort();
    Ok(uris)
  }

  async fn set_description(
    &mut self,
    dataset: &Dataset,
    description: &serde_json::Value,
  ) -> Result<()> {
    let path = self.dataset_file(dataset, DESCRIPTION_FILE);
    fs::write(path, serde_json::to_string(description)?)?;
    Ok(())
  }

  async fn get_description(&mut self, dataset: &Dataset) -> Result<serde_json::Value> {
    let path = self.dataset_file(dataset, DESCRIPTION_FILE);
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
  }

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn new_location(
    &mut self,
    dataset: &Dataset,
    annotations: Option<&AnnotationMap>,
  ) -> Result<Location> {
    let index = self.dataset_index(&dataset.uri).await?;
    let id = index.insert_location().await?;
    for (key, value) in annotations.into_iter().flatten() {
      index.insert_location_annotation(id, key, value).await?;
    }
    Ok(Location { dataset: dataset.clone(), id })
  }

  async fn annotate_location(
    &mut self,
    location: &Location,
    key: &str,
    value: &AnnotationValue,
  ) -> Result<()> {
    let index = self.dataset_index(&location.dataset.uri).await?;
    index.insert_location_annotation(location.id, key, value).await
  }

  async fn annotate_data(
    &mut self,
    data: &DataInfo,
    key: &str,
    value: &AnnotationValue,
  ) -> Result<()> {
    let index = self.dataset_index(&data.location.dataset.uri).await?;
    index.insert_data_annotation(&data.uri, key, value).await
  }

  async fn create_data(
    &mut self,
    target: &DataTarget,
    uri: &str,
    kind: &str,
    annotations: Option<&AnnotationMap>,
    metadata_uri: Option<&str>,
  ) -> Result<DataInfo> {
    let dataset = match target {
      DataTarget::Dataset(dataset) => dataset,
      DataTarget::Location(location) => &location.dataset,
    };
    let location_id = match target {
      DataTarget::Dataset(_) => {
        self.dataset_index(&dataset.uri).await?.insert_location().await?
      }
      DataTarget::Location(location) => location.id,
    };

    let index = self.dataset_index(&dataset.uri).await?;
    index.insert_data(location_id, uri, kind, metadata_uri).await?;
    for (key, value) in annotations.into_iter().flatten() {
      index.insert_data_annotation(uri, key, value).await?;
    }

    index.get_data_record(uri).await?.into_data_info(dataset)
  }

  async fn get_data(&mut self, dataset: &Dataset, uri: &str) -> Result<DataInfo> {
    let index = self.dataset_index(&dataset.uri).await?;
    index.get_data_record(uri).await?.into_data_info(dataset)
  }

  async fn delete_data(&mut self, data: &DataInfo) -> Result<()> {
    let index = self.dataset_index(&data.location.dataset.uri).await?;
    index.delete_data(&data.uri).await
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  async fn query_data(
    &mut self,
    dataset: &Dataset,
    query: &DataQuery,
  ) -> Result<Vec<DataInfo>> {
    let index = self.dataset_index(&dataset.uri).await?;
    let records = match (&query.annotations, &query.locations) {
      (Some(_), Some(_)) => return Err(Error::AmbiguousQuery),
      (None, Some(locations)) => {
        let ids: Vec<_> = locations.iter().map(|l| l.id).collect();
        index.query_data_at(&ids).await?
      }
      (annotations, None) => {
        let empty = AnnotationMap::new();
        index
          .query_data_records(annotations.as_ref().unwrap_or(&empty))
          .await?
      }
    };
    Self::into_data_infos(records, dataset)
  }

  async fn query_data_tuples(
    &mut self,
    dataset: &Dataset,
    annotations: &[AnnotationMap],
  ) -> Result<Vec<Vec<DataInfo>>> {
    let index = self.dataset_index(&dataset.uri).await?;
    let rows = index.query_data_tuples(annotations).await?;
    rows
      .into_iter()
      .map(|row| Self::into_data_infos(row, dataset))
      .collect()
  }

  async fn query_data_groups(
    &mut self,
    dataset: &Dataset,
    annotations: &[AnnotationMap],
  ) -> Result<Vec<Vec<DataInfo>>> {
    let index = self.dataset_index(&dataset.uri).await?;
    let groups = index.query_data_groups(annotations).await?;
    groups
      .into_iter()
      .map(|group| Self::into_data_infos(group, dataset))
      .collect()
  }

  async fn query_location(
    &mut self,
    dataset: &Dataset,
    annotations: Option<&AnnotationMap>,
  ) -> Result<Vec<Location>> {
    let index = self.dataset_index(&dataset.uri).await?;
    let empty = AnnotationMap::new();
    let ids = index
      .query_location_ids(annotations.unwrap_or(&empty))
      .await?;
    Ok(
      ids
        .into_iter()
        .map(|id| Location { dataset: dataset.clone(), id })
        .collect(),
    )
  }

  // ── Introspection ─────────────────────────────────────────────────────────

  async fn list_data_annotation_values(
    &mut self,
    dataset: &Dataset,
  ) -> Result<BTreeMap<String, Vec<AnnotationValue>>> {
    let index = self.dataset_index(&dataset.uri).await?;
    index.annotation_values(AnnotationTable::Data).await
  }

  async fn list_location_annotation_values(
    &mut self,
    dataset: &Dataset,
  ) -> Result<BTreeMap<String, Vec<AnnotationValue>>> {
    let index = self.dataset_index(&dataset.uri).await?;
    index.annotation_values(AnnotationTable::Location).await
  }

  async fn view_locations(&mut self, dataset: &Dataset) -> Result<Table> {
    let index = self.dataset_index(&dataset.uri).await?;
    index.view_locations().await
  }

  async fn view_data(
    &mut self,
    dataset: &Dataset,
    locations: Option<&[Location]>,
  ) -> Result<Table> {
    let index = self.dataset_index(&dataset.uri).await?;
    let ids = locations.map(|ls| ls.iter().map(|l| l.id).collect::<Vec<_>>());
    index.view_data(ids.as_deref()).await
  }
}
