//! Error handling for customer ingestion and storage operations.
//!
//! Every structural failure surfaces as a single human-readable message.
//! Per-record rejections are not errors; see [`crate::validator::Rejection`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CustomerMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input file '{file_name}': expected a .csv file or a spreadsheet (.xlsx, .xlsm, .xlsb, .xls, .ods)")]
    UnsupportedFormat { file_name: String },

    #[error("Failed to read spreadsheet: {message}")]
    Spreadsheet { message: String },

    #[error("Input file is empty or invalid: no data rows found")]
    EmptyInput,

    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("No valid customer data found with required columns and coordinates")]
    NoValidData,

    #[error("Storage operation failed: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Store snapshot '{}' is not valid JSON", path.display())]
    CorruptSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl CustomerMapError {
    /// Create a storage error wrapping the underlying failure
    pub fn storage(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a storage error without an underlying source
    pub fn storage_message(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a spreadsheet decoding error
    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CustomerMapError>;
