//! `strata` — command-line front end for a Strata workspace.
//!
//! # Usage
//!
//! ```
//! strata -w ~/screens new-dataset "My Screen"
//! strata -w ~/screens create-data my_screen raw/0.tif image -a channel=0
//! strata -w ~/screens query-data my_screen -a channel=0
//! ```
//!
//! Annotation arguments take the form `key=value`; values parse as bool,
//! integer or real when they look like one, and fall back to text.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use strata_core::{
  annotation::{AnnotationMap, AnnotationValue},
  data::DataInfo,
  dataset::Location,
  index::{DataIndex, DataQuery, DataTarget},
};
use strata_store_sqlite::LocalIndex;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "strata", about = "Annotation-indexed dataset workspaces")]
struct Cli {
  /// Workspace directory (created if missing).
  #[arg(short, long, env = "STRATA_WORKSPACE", default_value = ".")]
  workspace: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create a new dataset in the workspace.
  NewDataset { name: String },

  /// List the workspace's dataset URIs.
  Datasets,

  /// Mint a new location, optionally annotated.
  NewLocation {
    dataset: String,
    /// Annotations as key=value, repeatable.
    #[arg(short, long = "annotation", value_parser = parse_annotation)]
    annotations: Vec<(String, AnnotationValue)>,
  },

  /// List locations, optionally filtered by annotations.
  Locations {
    dataset: String,
    #[arg(short, long = "annotation", value_parser = parse_annotation)]
    annotations: Vec<(String, AnnotationValue)>,
  },

  /// Attach an annotation to an existing location.
  AnnotateLocation {
    dataset:  String,
    location: i64,
    #[arg(value_parser = parse_annotation)]
    annotation: (String, AnnotationValue),
  },

  /// Register a data item.
  CreateData {
    dataset: String,
    uri:     String,
    /// Storage kind: image, tensor, table, value or label.
    kind:    String,
    /// Place at this location id; omitted, a fresh location is minted.
    #[arg(short, long)]
    location: Option<i64>,
    #[arg(short, long = "annotation", value_parser = parse_annotation)]
    annotations: Vec<(String, AnnotationValue)>,
    #[arg(short, long)]
    metadata_uri: Option<String>,
  },

  /// Attach an annotation to an existing data item.
  AnnotateData {
    dataset: String,
    uri:     String,
    #[arg(value_parser = parse_annotation)]
    annotation: (String, AnnotationValue),
  },

  /// Query data by annotations, or by location ids.
  QueryData {
    dataset: String,
    #[arg(short, long = "annotation", value_parser = parse_annotation)]
    annotations: Vec<(String, AnnotationValue)>,
    #[arg(short, long = "location")]
    locations: Vec<i64>,
  },

  /// Per-location tuples: one match per annotation set, all at the same
  /// location.
  QueryTuples {
    dataset: String,
    /// One set per flag, as comma-joined pairs: -s channel=0,stain=dapi
    #[arg(short, long = "set", value_parser = parse_annotation_set)]
    sets: Vec<AnnotationMap>,
  },

  /// Independent cohorts: one result set per annotation set.
  QueryGroups {
    dataset: String,
    #[arg(short, long = "set", value_parser = parse_annotation_set)]
    sets: Vec<AnnotationMap>,
  },

  /// List annotation keys and their values.
  Values {
    dataset: String,
    /// Data annotations instead of location annotations.
    #[arg(long)]
    data: bool,
  },

  /// Pivot view of locations.
  ViewLocations { dataset: String },

  /// Pivot view of data, optionally restricted to locations.
  ViewData {
    dataset: String,
    #[arg(short, long = "location")]
    locations: Vec<i64>,
  },

  /// Delete a data item and its annotations.
  DeleteData { dataset: String, uri: String },
}

// ─── Annotation argument parsing ──────────────────────────────────────────────

/// Infer a typed value from its command-line spelling.
fn parse_value(raw: &str) -> AnnotationValue {
  if let Ok(b) = raw.parse::<bool>() {
    return AnnotationValue::Boolean(b);
  }
  if let Ok(i) = raw.parse::<i64>() {
    return AnnotationValue::Integer(i);
  }
  if let Ok(r) = raw.parse::<f64>() {
    return AnnotationValue::Real(r);
  }
  AnnotationValue::Text(raw.to_string())
}

fn parse_annotation(raw: &str) -> Result<(String, AnnotationValue), String> {
  let (key, value) = raw
    .split_once('=')
    .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
  if key.is_empty() {
    return Err(format!("empty annotation key in {raw:?}"));
  }
  Ok((key.to_string(), parse_value(value)))
}

/// Comma-joined pairs; values containing commas need the API, not the CLI.
fn parse_annotation_set(raw: &str) -> Result<AnnotationMap, String> {
  raw.split(',').map(parse_annotation).collect()
}

fn to_map(pairs: Vec<(String, AnnotationValue)>) -> AnnotationMap {
  pairs.into_iter().collect()
}

fn optional_map(pairs: Vec<(String, AnnotationValue)>) -> Option<AnnotationMap> {
  if pairs.is_empty() { None } else { Some(to_map(pairs)) }
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_data(items: &[DataInfo]) {
  for item in items {
    let metadata = item.metadata_uri.as_deref().unwrap_or("-");
    println!(
      "{}\t{}\tlocation={}\tmetadata={}",
      item.uri,
      item.kind.as_str(),
      item.location.id,
      metadata,
    );
  }
}

fn print_rows(rows: &[Vec<DataInfo>]) {
  for row in rows {
    let uris: Vec<&str> = row.iter().map(|item| item.uri.as_str()).collect();
    println!("{}", uris.join("\t"));
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let mut store = LocalIndex::open(&cli.workspace)
    .with_context(|| format!("failed to open workspace {:?}", cli.workspace))?;

  let outcome = run(&mut store, cli.command).await;
  store.close().await.context("failed to close workspace")?;
  outcome
}

async fn run(store: &mut LocalIndex, command: Command) -> anyhow::Result<()> {
  match command {
    Command::NewDataset { name } => {
      let dataset = store.new_dataset(&name).await?;
      println!("{}", dataset.uri);
    }

    Command::Datasets => {
      for uri in store.datasets().await? {
        println!("{uri}");
      }
    }

    Command::NewLocation { dataset, annotations } => {
      let dataset = store.get_dataset(&dataset).await?;
      let location = store
        .new_location(&dataset, optional_map(annotations).as_ref())
        .await?;
      println!("{}", location.id);
    }

    Command::Locations { dataset, annotations } => {
      let dataset = store.get_dataset(&dataset).await?;
      let locations = store
        .query_location(&dataset, optional_map(annotations).as_ref())
        .await?;
      for location in locations {
        println!("{}", location.id);
      }
    }

    Command::AnnotateLocation { dataset, location, annotation } => {
      let dataset = store.get_dataset(&dataset).await?;
      let location = Location { dataset, id: location };
      store
        .annotate_location(&location, &annotation.0, &annotation.1)
        .await?;
    }

    Command::CreateData {
      dataset,
      uri,
      kind,
      location,
      annotations,
      metadata_uri,
    } => {
      let dataset = store.get_dataset(&dataset).await?;
      let target = match location {
        Some(id) => DataTarget::Location(Location { dataset, id }),
        None => DataTarget::Dataset(dataset),
      };
      let data = store
        .create_data(
          &target,
          &uri,
          &kind,
          optional_map(annotations).as_ref(),
          metadata_uri.as_deref(),
        )
        .await?;
      println!("{}\tlocation={}", data.uri, data.location.id);
    }

    Command::AnnotateData { dataset, uri, annotation } => {
      let dataset = store.get_dataset(&dataset).await?;
      let data = store.get_data(&dataset, &uri).await?;
      store.annotate_data(&data, &annotation.0, &annotation.1).await?;
    }

    Command::QueryData { dataset, annotations, locations } => {
      let dataset = store.get_dataset(&dataset).await?;
      let query = DataQuery {
        annotations: optional_map(annotations),
        locations:   locations_filter(&dataset, locations),
      };
      print_data(&store.query_data(&dataset, &query).await?);
    }

    Command::QueryTuples { dataset, sets } => {
      let dataset = store.get_dataset(&dataset).await?;
      print_rows(&store.query_data_tuples(&dataset, &sets).await?);
    }

    Command::QueryGroups { dataset, sets } => {
      let dataset = store.get_dataset(&dataset).await?;
      let groups = store.query_data_groups(&dataset, &sets).await?;
      for (index, group) in groups.iter().enumerate() {
        println!("# group {index}");
        print_data(group);
      }
    }

    Command::Values { dataset, data } => {
      let dataset = store.get_dataset(&dataset).await?;
      let values = if data {
        store.list_data_annotation_values(&dataset).await?
      } else {
        store.list_location_annotation_values(&dataset).await?
      };
      for (key, values) in values {
        let rendered: Vec<String> =
          values.iter().map(ToString::to_string).collect();
        println!("{key}: {}", rendered.join(", "));
      }
    }

    Command::ViewLocations { dataset } => {
      let dataset = store.get_dataset(&dataset).await?;
      print!("{}", store.view_locations(&dataset).await?);
    }

    Command::ViewData { dataset, locations } => {
      let dataset = store.get_dataset(&dataset).await?;
      let filter = locations_filter(&dataset, locations);
      print!("{}", store.view_data(&dataset, filter.as_deref()).await?);
    }

    Command::DeleteData { dataset, uri } => {
      let dataset = store.get_dataset(&dataset).await?;
      let data = store.get_data(&dataset, &uri).await?;
      store.delete_data(&data).await?;
    }
  }

  Ok(())
}

fn locations_filter(
  dataset: &strata_core::dataset::Dataset,
  ids: Vec<i64>,
) -> Option<Vec<Location>> {
  if ids.is_empty() {
    return None;
  }
  Some(
    ids
      .into_iter()
      .map(|id| Location { dataset: dataset.clone(), id })
      .collect(),
  )
}
