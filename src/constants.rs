//! Application constants for the customer map ingestion pipeline
//!
//! Column names, coordinate bounds, paging defaults and storage file names
//! used throughout the crate.

// =============================================================================
// Logical Columns
// =============================================================================

/// Logical column names, matched case-insensitively as substrings of headers
pub mod columns {
    pub const ACCOUNT_NUMBER: &str = "accno";
    pub const NAME: &str = "name";
    pub const LONGITUDE: &str = "longitude";
    /// Historical spelling kept from the source spreadsheets
    pub const LATITUDE: &str = "lattitude";

    pub const TARIFF_CODE: &str = "tariffcode";
    pub const KW_OR_HP: &str = "kworhp";
    pub const CONSUMER_STATUS: &str = "consumerstatus";
    pub const PHASE: &str = "phase";
    pub const METER_NUMBER: &str = "meterno";
    pub const CONSUMPTION: &str = "consumption";
    pub const READING_MONTH: &str = "rdngmonth";
}

// =============================================================================
// Coordinate Bounds
// =============================================================================

pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;
pub const LATITUDE_MIN: f64 = -90.0;
pub const LATITUDE_MAX: f64 = 90.0;

/// Default tolerance (decimal degrees) for coordinate lookups
pub const DEFAULT_LOCATE_TOLERANCE: f64 = 0.0001;

// =============================================================================
// Processing Defaults
// =============================================================================

/// Rows validated per chunk before yielding to the scheduler
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Records returned by the initial page and by searches
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Delay before a single search result is focused on the map
pub const DEFAULT_FOCUS_DELAY_MS: u64 = 500;

/// Records handed to the renderer per cursor page
pub const DEFAULT_RENDER_BATCH_SIZE: usize = 100;

// =============================================================================
// Input Formats
// =============================================================================

pub const DELIMITED_EXTENSIONS: &[&str] = &["csv"];
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

// =============================================================================
// Storage
// =============================================================================

/// Application directory under the platform data/config directories
pub const APP_DIR_NAME: &str = "customer-map";
pub const STORE_FILE_NAME: &str = "store.json";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Suffix given to an unreadable snapshot when it is moved aside
pub const CORRUPT_SUFFIX: &str = "corrupt";

/// Snapshot format version written to disk
pub const SNAPSHOT_VERSION: u32 = 1;

/// Upper sentinel appended to a search term to bound a prefix range scan
pub const PREFIX_SENTINEL: char = char::MAX;

// =============================================================================
// Environment Variables
// =============================================================================

pub const ENV_STORE_PATH: &str = "CUSTOMER_MAP_STORE";
pub const ENV_CHUNK_SIZE: &str = "CUSTOMER_MAP_CHUNK_SIZE";
pub const ENV_PAGE_SIZE: &str = "CUSTOMER_MAP_PAGE_SIZE";
