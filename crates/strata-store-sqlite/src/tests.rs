//! Integration tests for the SQLite index against an in-memory database,
//! plus workspace-facade tests against a temporary directory.

use strata_core::{
  annotation::{AnnotationMap, AnnotationValue},
  index::{DataIndex, DataQuery, DataTarget},
};
use tempfile::TempDir;

use crate::{DatasetIndex, Error, LocalIndex};

async fn index() -> DatasetIndex {
  DatasetIndex::open_in_memory().await.expect("in-memory index")
}

fn ann(pairs: &[(&str, AnnotationValue)]) -> AnnotationMap {
  pairs
    .iter()
    .map(|(key, value)| (key.to_string(), value.clone()))
    .collect()
}

// ─── Row-level operations ────────────────────────────────────────────────────

#[tokio::test]
async fn insert_location_mints_increasing_ids() {
  let idx = index().await;
  let first = idx.insert_location().await.unwrap();
  let second = idx.insert_location().await.unwrap();
  assert!(second > first);
}

#[tokio::test]
async fn annotation_keys_are_interned_once() {
  let idx = index().await;
  let a = idx.insert_annotation_key("stain").await.unwrap();
  let b = idx.insert_annotation_key("stain").await.unwrap();
  let c = idx.insert_annotation_key("channel").await.unwrap();
  assert_eq!(a, b);
  assert_ne!(a, c);
}

#[tokio::test]
async fn annotate_unknown_location_errors() {
  let idx = index().await;
  let err = idx
    .insert_location_annotation(42, "stain", &"dapi".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::LocationNotFound(42)));
}

#[tokio::test]
async fn annotate_unknown_data_uri_errors() {
  let idx = index().await;
  let err = idx
    .insert_data_annotation("missing.tif", "channel", &0.into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DataNotFound(_)));
}

#[tokio::test]
async fn insert_data_rejects_unknown_storage_kind() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  let err = idx
    .insert_data(location, "a.tif", "hologram", None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownStorageKind(_)));
}

#[tokio::test]
async fn insert_data_rejects_duplicate_uri() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
  let err = idx
    .insert_data(location, "a.tif", "image", None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateUri(_)));
}

#[tokio::test]
async fn get_data_record_roundtrip() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_data(location, "a.zarr", "tensor", Some("meta://7"))
    .await
    .unwrap();

  let record = idx.get_data_record("a.zarr").await.unwrap();
  assert_eq!(record.location_id, location);
  assert_eq!(record.kind, "tensor");
  assert_eq!(record.metadata_uri, "meta://7");

  let err = idx.get_data_record("b.zarr").await.unwrap_err();
  assert!(matches!(err, Error::DataNotFound(_)));
}

#[tokio::test]
async fn delete_data_removes_annotations_and_frees_uri() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("a.tif", "channel", &0.into())
    .await
    .unwrap();

  idx.delete_data("a.tif").await.unwrap();

  // No data row, no orphaned annotation rows.
  assert!(matches!(
    idx.get_data_record("a.tif").await.unwrap_err(),
    Error::DataNotFound(_)
  ));
  let values = idx
    .annotation_values(crate::query::AnnotationTable::Data)
    .await
    .unwrap();
  assert!(values.is_empty());

  // The URI is reusable without tripping the unique constraint.
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
}

#[tokio::test]
async fn delete_unknown_data_errors() {
  let idx = index().await;
  let err = idx.delete_data("nope.tif").await.unwrap_err();
  assert!(matches!(err, Error::DataNotFound(_)));
}

// ─── Location superset queries ───────────────────────────────────────────────

#[tokio::test]
async fn location_query_returns_exact_superset_match() {
  let idx = index().await;
  let target = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(target, "stain", &"dapi".into())
    .await
    .unwrap();
  idx
    .insert_location_annotation(target, "section", &3.into())
    .await
    .unwrap();

  // A second location with unrelated annotations must not appear.
  let other = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(other, "stain", &"gfp".into())
    .await
    .unwrap();

  let found = idx
    .query_location_ids(&ann(&[
      ("stain", "dapi".into()),
      ("section", 3.into()),
    ]))
    .await
    .unwrap();
  assert_eq!(found, vec![target]);
}

#[tokio::test]
async fn location_with_strict_subset_is_never_returned() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(location, "stain", &"dapi".into())
    .await
    .unwrap();

  let found = idx
    .query_location_ids(&ann(&[
      ("stain", "dapi".into()),
      ("section", 3.into()),
    ]))
    .await
    .unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn empty_location_query_returns_every_location() {
  let idx = index().await;
  let a = idx.insert_location().await.unwrap();
  let b = idx.insert_location().await.unwrap();

  let found = idx.query_location_ids(&AnnotationMap::new()).await.unwrap();
  assert_eq!(found, vec![a, b]);
}

/// The counting boundary: the match count reaches `n` only via distinct
/// matching (key, value) pairs. A pair annotated twice verbatim overflows
/// the count past `n` and disqualifies the location; a second, different
/// value under the same key contributes no matching row and leaves the
/// count untouched.
#[tokio::test]
async fn duplicate_annotations_and_the_count_boundary() {
  let idx = index().await;

  let conflicted = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(conflicted, "stain", &"dapi".into())
    .await
    .unwrap();
  idx
    .insert_location_annotation(conflicted, "stain", &"gfp".into())
    .await
    .unwrap();

  let doubled = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(doubled, "stain", &"dapi".into())
    .await
    .unwrap();
  idx
    .insert_location_annotation(doubled, "stain", &"dapi".into())
    .await
    .unwrap();

  let found = idx
    .query_location_ids(&ann(&[("stain", "dapi".into())]))
    .await
    .unwrap();

  // `conflicted` matches on its single dapi row; `doubled` reaches a
  // count of two for a one-pair query and is excluded.
  assert_eq!(found, vec![conflicted]);
}

#[tokio::test]
async fn typed_values_do_not_cross_match() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(location, "section", &3.into())
    .await
    .unwrap();

  // Requesting the text "3" must not match the integer 3.
  let found = idx
    .query_location_ids(&ann(&[("section", "3".into())]))
    .await
    .unwrap();
  assert!(found.is_empty());

  let found = idx
    .query_location_ids(&ann(&[("section", 3.into())]))
    .await
    .unwrap();
  assert_eq!(found, vec![location]);
}

#[tokio::test]
async fn unknown_annotation_key_is_an_error() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(location, "stain", &"dapi".into())
    .await
    .unwrap();

  let err = idx
    .query_location_ids(&ann(&[("satin", "dapi".into())]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoMatchingAnnotations));

  let err = idx
    .query_data_records(&ann(&[("satin", "dapi".into())]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoMatchingAnnotations));
}

// ─── Data superset queries ───────────────────────────────────────────────────

#[tokio::test]
async fn data_query_on_location_annotations_only() {
  let idx = index().await;
  let stained = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(stained, "stain", &"dapi".into())
    .await
    .unwrap();
  idx.insert_data(stained, "a.tif", "image", None).await.unwrap();

  let plain = idx.insert_location().await.unwrap();
  idx.insert_data(plain, "b.tif", "image", None).await.unwrap();

  let found = idx
    .query_data_records(&ann(&[("stain", "dapi".into())]))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "a.tif");
  assert_eq!(found[0].location_id, stained);
}

#[tokio::test]
async fn data_query_on_data_annotations_only() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "c0.tif", "image", None).await.unwrap();
  idx.insert_data(location, "c1.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("c0.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("c1.tif", "channel", &1.into())
    .await
    .unwrap();

  let found = idx
    .query_data_records(&ann(&[("channel", 1.into())]))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "c1.tif");
}

#[tokio::test]
async fn data_query_split_across_both_tables() {
  let idx = index().await;
  let stained = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(stained, "stain", &"dapi".into())
    .await
    .unwrap();
  idx.insert_data(stained, "a.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("a.tif", "channel", &0.into())
    .await
    .unwrap();

  // Same location, wrong channel.
  idx.insert_data(stained, "b.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("b.tif", "channel", &1.into())
    .await
    .unwrap();

  let found = idx
    .query_data_records(&ann(&[
      ("stain", "dapi".into()),
      ("channel", 0.into()),
    ]))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "a.tif");
}

#[tokio::test]
async fn split_query_counts_either_side_alone() {
  let idx = index().await;

  // Keys live in both tables dataset-wide, but this item satisfies the
  // whole conjunction through its own annotations.
  let stained = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(stained, "stain", &"dapi".into())
    .await
    .unwrap();
  idx.insert_data(stained, "a.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("a.tif", "channel", &0.into())
    .await
    .unwrap();

  let plain = idx.insert_location().await.unwrap();
  idx.insert_data(plain, "b.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("b.tif", "stain", &"dapi".into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("b.tif", "channel", &0.into())
    .await
    .unwrap();

  let mut uris: Vec<String> = idx
    .query_data_records(&ann(&[
      ("stain", "dapi".into()),
      ("channel", 0.into()),
    ]))
    .await
    .unwrap()
    .into_iter()
    .map(|record| record.uri)
    .collect();
  uris.sort();
  assert_eq!(uris, ["a.tif", "b.tif"]);
}

#[tokio::test]
async fn empty_data_query_returns_every_item() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
  idx.insert_data(location, "b.csv", "table", None).await.unwrap();

  let found = idx.query_data_records(&AnnotationMap::new()).await.unwrap();
  assert_eq!(found.len(), 2);
}

// ─── Tuple and group composition ─────────────────────────────────────────────

#[tokio::test]
async fn tuple_query_pairs_matches_at_the_same_location() {
  let idx = index().await;
  let paired = idx.insert_location().await.unwrap();
  idx.insert_data(paired, "c0.tif", "image", None).await.unwrap();
  idx.insert_data(paired, "c1.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("c0.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("c1.tif", "channel", &1.into())
    .await
    .unwrap();

  // A location with only one channel contributes no tuple.
  let unpaired = idx.insert_location().await.unwrap();
  idx.insert_data(unpaired, "solo.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("solo.tif", "channel", &0.into())
    .await
    .unwrap();

  let tuples = idx
    .query_data_tuples(&[
      ann(&[("channel", 0.into())]),
      ann(&[("channel", 1.into())]),
    ])
    .await
    .unwrap();

  assert_eq!(tuples.len(), 1);
  assert_eq!(tuples[0].len(), 2);
  assert_eq!(tuples[0][0].uri, "c0.tif");
  assert_eq!(tuples[0][1].uri, "c1.tif");
  assert_eq!(tuples[0][0].location_id, paired);
}

#[tokio::test]
async fn tuple_query_multiplies_multiple_matches() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  for uri in ["a0.tif", "b0.tif", "m.tif"] {
    idx.insert_data(location, uri, "image", None).await.unwrap();
  }
  idx
    .insert_data_annotation("a0.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("b0.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("m.tif", "kind", &"mask".into())
    .await
    .unwrap();

  let tuples = idx
    .query_data_tuples(&[
      ann(&[("channel", 0.into())]),
      ann(&[("kind", "mask".into())]),
    ])
    .await
    .unwrap();

  // Two channel-0 items joined against one mask: two tuples.
  assert_eq!(tuples.len(), 2);
  assert!(tuples.iter().all(|row| row[1].uri == "m.tif"));
}

#[tokio::test]
async fn tuple_query_with_no_sets_errors() {
  let idx = index().await;
  assert!(matches!(
    idx.query_data_tuples(&[]).await.unwrap_err(),
    Error::EmptyQuery
  ));
  assert!(matches!(
    idx.query_data_groups(&[]).await.unwrap_err(),
    Error::EmptyQuery
  ));
}

#[tokio::test]
async fn group_query_keeps_result_sets_apart() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "c0.tif", "image", None).await.unwrap();
  idx.insert_data(location, "c1.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("c0.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("c1.tif", "channel", &1.into())
    .await
    .unwrap();

  let groups = idx
    .query_data_groups(&[
      ann(&[("channel", 0.into())]),
      ann(&[("channel", 1.into())]),
    ])
    .await
    .unwrap();

  assert_eq!(groups.len(), 2);
  assert_eq!(groups[0][0].uri, "c0.tif");
  assert_eq!(groups[1][0].uri, "c1.tif");
}

// ─── Annotation introspection ────────────────────────────────────────────────

#[tokio::test]
async fn annotation_values_are_distinct_and_typed() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
  idx.insert_data(location, "b.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("a.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("b.tif", "channel", &0.into())
    .await
    .unwrap();
  idx
    .insert_data_annotation("b.tif", "valid", &true.into())
    .await
    .unwrap();

  let values = idx
    .annotation_values(crate::query::AnnotationTable::Data)
    .await
    .unwrap();

  assert_eq!(values.len(), 2);
  assert_eq!(values["channel"], vec![AnnotationValue::Integer(0)]);
  assert_eq!(values["valid"], vec![AnnotationValue::Boolean(true)]);
}

// ─── Pivot views ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn locations_view_pivots_keys_into_columns() {
  let idx = index().await;
  let stained = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(stained, "stain", &"dapi".into())
    .await
    .unwrap();
  let bare = idx.insert_location().await.unwrap();

  let view = idx.view_locations().await.unwrap();
  assert_eq!(view.columns(), ["location_id", "stain"]);
  assert_eq!(view.len(), 2);
  assert_eq!(view.get(0, "location_id"), Some(stained.to_string().as_str()));
  assert_eq!(view.get(0, "stain"), Some("dapi"));
  // The unannotated location still gets a row, with an absent cell.
  assert_eq!(view.get(1, "location_id"), Some(bare.to_string().as_str()));
  assert_eq!(view.get(1, "stain"), None);
}

#[tokio::test]
async fn data_view_roundtrip() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(location, "stain", &"dapi".into())
    .await
    .unwrap();
  idx.insert_data(location, "uri1", "image", None).await.unwrap();
  idx
    .insert_data_annotation("uri1", "channel", &0.into())
    .await
    .unwrap();

  let view = idx.view_data(None).await.unwrap();
  assert_eq!(view.len(), 1);
  assert_eq!(view.get(0, "stain"), Some("dapi"));
  assert_eq!(view.get(0, "channel"), Some("0"));
  assert_eq!(view.get(0, "format"), Some("image"));
  assert_eq!(view.get(0, "location"), Some(location.to_string().as_str()));
}

#[tokio::test]
async fn data_view_respects_location_filter() {
  let idx = index().await;
  let kept = idx.insert_location().await.unwrap();
  let dropped = idx.insert_location().await.unwrap();
  idx.insert_data(kept, "kept.tif", "image", None).await.unwrap();
  idx.insert_data(dropped, "dropped.tif", "image", None).await.unwrap();

  let view = idx.view_data(Some(&[kept])).await.unwrap();
  assert_eq!(view.len(), 1);
  assert_eq!(view.get(0, "location"), Some(kept.to_string().as_str()));

  let empty = idx.view_data(Some(&[])).await.unwrap();
  assert!(empty.is_empty());
}

#[tokio::test]
async fn data_view_suffixes_colliding_columns() {
  let idx = index().await;
  let location = idx.insert_location().await.unwrap();
  idx
    .insert_location_annotation(location, "origin", &"scope".into())
    .await
    .unwrap();
  idx.insert_data(location, "a.tif", "image", None).await.unwrap();
  idx
    .insert_data_annotation("a.tif", "origin", &"camera".into())
    .await
    .unwrap();

  let view = idx.view_data(None).await.unwrap();
  assert!(view.column_index("origin").is_some());
  assert!(view.column_index("origin_1").is_some());
  assert_eq!(view.get(0, "origin"), Some("scope"));
  assert_eq!(view.get(0, "origin_1"), Some("camera"));
}

// ─── Workspace facade ────────────────────────────────────────────────────────

fn workspace() -> (TempDir, LocalIndex) {
  let dir = TempDir::new().expect("tempdir");
  let store = LocalIndex::open(dir.path()).expect("workspace");
  (dir, store)
}

#[tokio::test]
async fn new_dataset_creates_directory_layout() {
  let (dir, mut store) = workspace();
  let dataset = store.new_dataset("My Screen").await.unwrap();

  assert_eq!(dataset.uri, "my_screen");
  assert!(dir.path().join("my_screen").join("info.json").is_file());
  assert!(dir.path().join("my_screen").join("index.db").is_file());
}

#[tokio::test]
async fn duplicate_dataset_name_errors() {
  let (_dir, mut store) = workspace();
  store.new_dataset("screen").await.unwrap();
  let err = store.new_dataset("screen").await.unwrap_err();
  assert!(matches!(err, Error::DuplicateDataset(_)));
}

#[tokio::test]
async fn get_dataset_roundtrip() {
  let (_dir, mut store) = workspace();
  let created = store.new_dataset("My Screen").await.unwrap();
  let fetched = store.get_dataset(&created.uri).await.unwrap();
  assert_eq!(fetched, created);

  let err = store.get_dataset("absent").await.unwrap_err();
  assert!(matches!(err, Error::DatasetNotFound(_)));
}

#[tokio::test]
async fn datasets_lists_workspace_entries() {
  let (_dir, mut store) = workspace();
  store.new_dataset("beta").await.unwrap();
  store.new_dataset("alpha").await.unwrap();
  assert_eq!(store.datasets().await.unwrap(), ["alpha", "beta"]);
}

#[tokio::test]
async fn description_roundtrip() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();

  let description = serde_json::json!({"author": "jo", "passes": 3});
  store.set_description(&dataset, &description).await.unwrap();
  assert_eq!(store.get_description(&dataset).await.unwrap(), description);
}

#[tokio::test]
async fn create_data_at_dataset_mints_a_location() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();

  let data = store
    .create_data(
      &DataTarget::Dataset(dataset.clone()),
      "a.tif",
      "image",
      None,
      None,
    )
    .await
    .unwrap();

  let locations = store.query_location(&dataset, None).await.unwrap();
  assert_eq!(locations.len(), 1);
  assert_eq!(locations[0].id, data.location.id);
}

#[tokio::test]
async fn facade_query_by_annotations() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();
  let location = store
    .new_location(&dataset, Some(&ann(&[("stain", "dapi".into())])))
    .await
    .unwrap();
  store
    .create_data(
      &DataTarget::Location(location.clone()),
      "a.tif",
      "image",
      Some(&ann(&[("channel", 0.into())])),
      Some("meta://1"),
    )
    .await
    .unwrap();

  let query = DataQuery {
    annotations: Some(ann(&[("stain", "dapi".into()), ("channel", 0.into())])),
    locations:   None,
  };
  let found = store.query_data(&dataset, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "a.tif");
  assert_eq!(found[0].metadata_uri.as_deref(), Some("meta://1"));
  assert_eq!(found[0].location, location);
}

#[tokio::test]
async fn facade_query_by_locations() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();
  let kept = store.new_location(&dataset, None).await.unwrap();
  let dropped = store.new_location(&dataset, None).await.unwrap();
  for (uri, location) in [("kept.tif", &kept), ("dropped.tif", &dropped)] {
    store
      .create_data(
        &DataTarget::Location(location.clone()),
        uri,
        "image",
        None,
        None,
      )
      .await
      .unwrap();
  }

  let query = DataQuery {
    annotations: None,
    locations:   Some(vec![kept.clone()]),
  };
  let found = store.query_data(&dataset, &query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "kept.tif");
}

#[tokio::test]
async fn combined_filters_are_ambiguous() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();
  let location = store.new_location(&dataset, None).await.unwrap();

  let query = DataQuery {
    annotations: Some(ann(&[("stain", "dapi".into())])),
    locations:   Some(vec![location]),
  };
  let err = store.query_data(&dataset, &query).await.unwrap_err();
  assert!(matches!(err, Error::AmbiguousQuery));
}

#[tokio::test]
async fn facade_delete_and_recreate() {
  let (_dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();
  let data = store
    .create_data(
      &DataTarget::Dataset(dataset.clone()),
      "a.tif",
      "image",
      Some(&ann(&[("channel", 0.into())])),
      None,
    )
    .await
    .unwrap();

  store.delete_data(&data).await.unwrap();
  assert!(matches!(
    store.get_data(&dataset, "a.tif").await.unwrap_err(),
    Error::DataNotFound(_)
  ));

  store
    .create_data(
      &DataTarget::Location(data.location.clone()),
      "a.tif",
      "image",
      None,
      None,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn facade_survives_reopen_and_close() {
  let (dir, mut store) = workspace();
  let dataset = store.new_dataset("screen").await.unwrap();
  store
    .create_data(
      &DataTarget::Dataset(dataset.clone()),
      "a.tif",
      "image",
      None,
      None,
    )
    .await
    .unwrap();
  store.close().await.unwrap();

  // A fresh facade over the same workspace sees the persisted rows.
  let mut reopened = LocalIndex::open(dir.path()).unwrap();
  let dataset = reopened.get_dataset("screen").await.unwrap();
  let found = reopened
    .query_data(&dataset, &DataQuery::default())
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].uri, "a.tif");
  reopened.close().await.unwrap();
}
