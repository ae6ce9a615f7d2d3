//! BigQuery Emulator Engine
//!
//! In-memory catalog, row coercion and the two-shape query engine behind
//! the fake BigQuery REST server.

pub mod catalog;
pub mod coercion;
pub mod error;
pub mod executor;
pub mod jobs;
pub mod parser;
pub mod protocol;
pub mod types;
pub mod warehouse;

pub use error::{Error, Result};
pub use executor::Executor;
pub use warehouse::Warehouse;
