//! On-disk snapshot format for the customer store.
//!
//! The whole table is written as one JSON document to a temporary file in
//! the target directory and renamed over the previous snapshot, so a reader
//! sees either the old snapshot or the new one.

use crate::constants::{CORRUPT_SUFFIX, SNAPSHOT_VERSION};
use crate::error::{CustomerMapError, Result};
use crate::models::Customer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Auxiliary state persisted alongside the customer table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreMetadata {
    /// File name the current dataset was ingested from
    pub source: Option<String>,
    /// Rows seen in the source file before validation
    pub original_record_count: Option<usize>,
    pub ingested_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Snapshot as read from disk
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub metadata: StoreMetadata,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    metadata: &'a StoreMetadata,
    customers: Vec<&'a Customer>,
}

/// Read a snapshot; `Ok(None)` when no snapshot exists yet
///
/// Content that does not parse is reported as
/// [`CustomerMapError::CorruptSnapshot`]. I/O failures and snapshots from a
/// newer format version are storage errors.
pub fn read(path: &Path) -> Result<Option<Snapshot>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(CustomerMapError::storage(
                format!("failed to read snapshot '{}'", path.display()),
                e,
            ));
        }
    };

    let snapshot: Snapshot =
        serde_json::from_slice(&bytes).map_err(|source| CustomerMapError::CorruptSnapshot {
            path: path.to_path_buf(),
            source,
        })?;

    if snapshot.version > SNAPSHOT_VERSION {
        return Err(CustomerMapError::storage_message(format!(
            "snapshot '{}' has unsupported version {} (expected {})",
            path.display(),
            snapshot.version,
            SNAPSHOT_VERSION
        )));
    }

    Ok(Some(snapshot))
}

/// Serialize a snapshot document
pub fn encode<'a>(
    metadata: &StoreMetadata,
    customers: impl Iterator<Item = &'a Customer>,
) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        metadata,
        customers: customers.collect(),
    };
    serde_json::to_vec(&snapshot)
        .map_err(|e| CustomerMapError::storage("failed to serialize snapshot", e))
}

/// Atomically replace the snapshot at `path` with encoded bytes
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let directory = parent_dir(path);
    fs::create_dir_all(&directory).map_err(|e| {
        CustomerMapError::storage(
            format!("failed to create store directory '{}'", directory.display()),
            e,
        )
    })?;

    let mut temp = NamedTempFile::new_in(&directory)
        .map_err(|e| CustomerMapError::storage("failed to create temporary snapshot", e))?;
    temp.write_all(bytes)
        .map_err(|e| CustomerMapError::storage("failed to write snapshot", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| CustomerMapError::storage("failed to sync snapshot", e))?;
    temp.persist(path).map_err(|e| {
        CustomerMapError::storage(
            format!("failed to replace snapshot '{}'", path.display()),
            e.error,
        )
    })?;

    debug!("Wrote {} byte snapshot to {}", bytes.len(), path.display());
    Ok(())
}

/// Move an unparsable snapshot aside so the store can start empty
///
/// The target is `<path>.corrupt-<timestamp>`, with a counter appended if
/// that name is taken, so earlier quarantined snapshots are never replaced.
pub fn quarantine(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let mut base = path.as_os_str().to_owned();
    base.push(format!(".{}-{}", CORRUPT_SUFFIX, stamp));

    let mut target = PathBuf::from(&base);
    let mut attempt = 1;
    while target.exists() {
        let mut candidate = base.clone();
        candidate.push(format!("-{}", attempt));
        target = PathBuf::from(candidate);
        attempt += 1;
    }

    fs::rename(path, &target).map_err(|e| {
        CustomerMapError::storage(
            format!("failed to move unreadable snapshot '{}'", path.display()),
            e,
        )
    })?;
    Ok(target)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
