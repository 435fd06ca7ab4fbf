//! [`DatasetIndex`] — the per-dataset connection handle and row-level
//! operations.
//!
//! Every mutating operation commits before returning; there is no
//! cross-call transactional batching. The higher-level query engine lives
//! in `query.rs` and the pivot views in `view.rs`, both as further `impl`
//! blocks on this type.

use std::path::Path;

use rusqlite::OptionalExtension as _;

use strata_core::{
  annotation::AnnotationValue,
  dataset::{DataId, KeyId, LocationId},
};

use crate::{
  Error, Result,
  encode::{RawData, encode_metadata_uri, encode_value},
  schema::{PRAGMAS, SCHEMA},
};

/// One open dataset index, backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct DatasetIndex {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl DatasetIndex {
  /// Open (or create) the index at `path` and run schema initialization.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let index = Self { conn };
    index.init_schema().await?;
    Ok(index)
  }

  /// Open an in-memory index — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let index = Self { conn };
    index.init_schema().await?;
    Ok(index)
  }

  /// Pragmas first (WAL cannot change inside a transaction), then all DDL
  /// in one transaction so failure never leaves a partial schema.
  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the underlying connection. Dropping the handle also releases
  /// it; this method only makes the release point explicit.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  // ── Row-level operations ──────────────────────────────────────────────────

  /// Mint a new location row and return its surrogate id.
  pub async fn insert_location(&self) -> Result<LocationId> {
    let id = self
      .conn
      .call(|conn| {
        conn.execute("INSERT INTO location DEFAULT VALUES", [])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub(crate) async fn location_exists(&self, id: LocationId) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM location WHERE id = ?1",
              rusqlite::params![id],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  /// Intern an annotation key: look it up by name, insert if absent.
  /// Idempotent.
  pub async fn insert_annotation_key(&self, name: &str) -> Result<KeyId> {
    let name = name.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        let existing: Option<KeyId> = conn
          .query_row(
            "SELECT id FROM annotation_key WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
          )
          .optional()?;
        if let Some(id) = existing {
          return Ok(id);
        }
        conn.execute(
          "INSERT INTO annotation_key (name) VALUES (?1)",
          rusqlite::params![name],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn insert_location_annotation(
    &self,
    location_id: LocationId,
    key: &str,
    value: &AnnotationValue,
  ) -> Result<()> {
    if !self.location_exists(location_id).await? {
      return Err(Error::LocationNotFound(location_id));
    }
    let key_id = self.insert_annotation_key(key).await?;
    let (text, kind) = encode_value(value);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO location_annotation (location_id, key_id, value, kind)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![location_id, key_id, text, kind],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) async fn data_id_for_uri(&self, uri: &str) -> Result<Option<DataId>> {
    let uri = uri.to_owned();
    let id = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id FROM data WHERE uri = ?1",
              rusqlite::params![uri],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(id)
  }

  /// Annotate the data item with the given URI. Fails if the URI is not
  /// registered.
  pub async fn insert_data_annotation(
    &self,
    uri: &str,
    key: &str,
    value: &AnnotationValue,
  ) -> Result<()> {
    let Some(data_id) = self.data_id_for_uri(uri).await? else {
      return Err(Error::DataNotFound(uri.to_owned()));
    };
    let key_id = self.insert_annotation_key(key).await?;
    let (text, kind) = encode_value(value);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO data_annotation (data_id, key_id, value, kind)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![data_id, key_id, text, kind],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a data row at an existing location.
  pub async fn insert_data(
    &self,
    location_id: LocationId,
    uri: &str,
    kind: &str,
    metadata_uri: Option<&str>,
  ) -> Result<DataId> {
    let type_id = self.storage_type_id(kind).await?;
    if !self.location_exists(location_id).await? {
      return Err(Error::LocationNotFound(location_id));
    }
    if self.data_id_for_uri(uri).await?.is_some() {
      return Err(Error::DuplicateUri(uri.to_owned()));
    }

    let uri = uri.to_owned();
    let metadata = encode_metadata_uri(metadata_uri);
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO data (location_id, type_id, uri, metadata_uri)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![location_id, type_id, uri, metadata],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  /// Resolve a storage-kind name against the closed lookup table.
  async fn storage_type_id(&self, kind: &str) -> Result<i64> {
    let name = kind.to_owned();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id FROM storage_type WHERE name = ?1",
              rusqlite::params![name],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    id.ok_or_else(|| Error::UnknownStorageKind(kind.to_owned()))
  }

  /// Read a single data row by URI.
  pub async fn get_data_record(&self, uri: &str) -> Result<RawData> {
    let uri_owned = uri.to_owned();
    let raw: Option<RawData> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT data.location_id, data.uri, storage_type.name, data.metadata_uri
               FROM data
               INNER JOIN storage_type ON storage_type.id = data.type_id
               WHERE data.uri = ?1",
              rusqlite::params![uri_owned],
              |row| {
                Ok(RawData {
                  location_id:  row.get(0)?,
                  uri:          row.get(1)?,
                  kind:         row.get(2)?,
                  metadata_uri: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.ok_or_else(|| Error::DataNotFound(uri.to_owned()))
  }

  /// Delete a data row and its annotations in one transaction, so no
  /// orphaned annotation rows can survive.
  pub async fn delete_data(&self, uri: &str) -> Result<()> {
    let uri_owned = uri.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM data_annotation
           WHERE data_id = (SELECT id FROM data WHERE uri = ?1)",
          rusqlite::params![uri_owned],
        )?;
        let deleted =
          tx.execute("DELETE FROM data WHERE uri = ?1", rusqlite::params![uri_owned])?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::DataNotFound(uri.to_owned()));
    }
    Ok(())
  }
}
