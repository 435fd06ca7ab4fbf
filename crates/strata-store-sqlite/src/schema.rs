//! SQL schema for a dataset's `index.db`.
//!
//! Connection pragmas are applied first, outside any transaction (WAL mode
//! cannot change inside one); the DDL itself runs in a single transaction
//! so a failed initialization never leaves a half-built schema behind.

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` and
/// `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS location (
    id INTEGER PRIMARY KEY
);

-- Closed lookup table of recognized payload kinds.
CREATE TABLE IF NOT EXISTS storage_type (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS data (
    id           INTEGER PRIMARY KEY,
    location_id  INTEGER NOT NULL REFERENCES location(id),
    type_id      INTEGER NOT NULL REFERENCES storage_type(id),
    uri          TEXT NOT NULL UNIQUE,
    metadata_uri TEXT NOT NULL DEFAULT ''
);

-- Annotation keys are interned once per dataset; annotation rows carry
-- only the surrogate id.
CREATE TABLE IF NOT EXISTS annotation_key (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- One row per (entity, key, value). Deliberately not unique on
-- (entity, key): an entity can accumulate several values for one key.
CREATE TABLE IF NOT EXISTS location_annotation (
    location_id INTEGER NOT NULL REFERENCES location(id),
    key_id      INTEGER NOT NULL REFERENCES annotation_key(id),
    value       TEXT NOT NULL,
    kind        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS data_annotation (
    data_id INTEGER NOT NULL REFERENCES data(id),
    key_id  INTEGER NOT NULL REFERENCES annotation_key(id),
    value   TEXT NOT NULL,
    kind    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS data_location_idx                ON data(location_id);
CREATE INDEX IF NOT EXISTS location_annotation_location_idx ON location_annotation(location_id);
CREATE INDEX IF NOT EXISTS location_annotation_key_idx      ON location_annotation(key_id);
CREATE INDEX IF NOT EXISTS data_annotation_data_idx         ON data_annotation(data_id);
CREATE INDEX IF NOT EXISTS data_annotation_key_idx          ON data_annotation(key_id);

INSERT OR IGNORE INTO storage_type (name) VALUES
    ('image'), ('tensor'), ('table'), ('value'), ('label');

PRAGMA user_version = 1;
";
