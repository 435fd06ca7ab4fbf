//! Core types and trait definitions for the Strata dataset index.
//!
//! This crate is deliberately free of database and I/O dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod annotation;
pub mod data;
pub mod dataset;
pub mod error;
pub mod index;
pub mod table;

pub use error::{Error, Result};
