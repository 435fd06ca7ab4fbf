//! SQLite backend for the Strata dataset index.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread per dataset without blocking the async runtime.

mod dataset;
mod encode;
mod predicate;
mod query;
mod schema;
mod store;
mod view;

pub mod error;

pub use dataset::DatasetIndex;
pub use error::{Error, Result};
pub use predicate::AnnotationPredicate;
pub use store::LocalIndex;

#[cfg(test)]
mod tests;
