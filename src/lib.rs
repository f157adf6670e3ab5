//! Customer Map Library
//!
//! Ingests tabular files describing utility customers with geographic
//! coordinates and keeps the valid customers in a persistent, indexed store
//! that a map view can page through and search without blocking.
//!
//! This library provides tools for:
//! - Parsing delimited text and the first sheet of spreadsheets into rows
//! - Resolving loosely named columns and validating each record
//! - Validating large inputs in chunks with cooperative yields and progress
//! - Storing customers with prefix indexes on account number and name
//! - Paginated and search-driven reads for renderers

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod models;
pub mod parser;
pub mod processor;
pub mod query;
pub mod schema;
pub mod store;
pub mod validator;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::Config;
pub use context::AppContext;
pub use error::{CustomerMapError, Result};
pub use models::{Customer, RawRow};
pub use processor::{IngestReport, IngestStats, Ingestor, ProgressSink};
pub use query::{FocusSink, QueryFacade};
pub use store::{IndexedStore, StoreHandle};
