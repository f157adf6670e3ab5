//! Persistent, indexed customer store.
//!
//! Customers live in a B-tree table keyed by account number, with two
//! ordered secondary indexes: the lowercased account number and the
//! lowercased name. Both support bounded prefix scans, so slices and
//! searches cost O(limit) rather than O(n).
//!
//! Every mutation is one atomic batch: the new table is staged, written as a
//! snapshot (see [`snapshot`]), and only then swapped in. A failed write
//! leaves the previously committed table untouched and readable.

use crate::error::{CustomerMapError, Result};
use crate::models::Customer;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod handle;
pub mod index;
pub mod query;
pub mod snapshot;

#[cfg(test)]
pub mod tests;

pub use handle::{HandleState, StoreHandle};
pub use index::SecondaryIndex;
pub use query::Page;
pub use snapshot::StoreMetadata;

/// Customer table with its secondary indexes
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    pub(crate) records: BTreeMap<String, Customer>,
    pub(crate) accno_index: SecondaryIndex,
    pub(crate) name_index: SecondaryIndex,
}

impl Table {
    fn from_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let mut table = Self::default();
        for customer in customers {
            table.upsert(customer);
        }
        table
    }

    /// Insert or overwrite by account number, keeping both indexes in step
    fn upsert(&mut self, mut customer: Customer) {
        customer.refresh_derived();
        if let Some(previous) = self.records.get(&customer.accno) {
            self.accno_index
                .remove(previous.accno_lower(), &previous.accno);
            self.name_index.remove(&previous.name_lower(), &previous.accno);
        }
        self.accno_index
            .insert(customer.accno_lower().to_string(), customer.accno.clone());
        self.name_index
            .insert(customer.name_lower(), customer.accno.clone());
        self.records.insert(customer.accno.clone(), customer);
    }
}

/// Customer store backed by a snapshot file
#[derive(Debug)]
pub struct IndexedStore {
    path: PathBuf,
    pub(crate) table: Table,
    metadata: StoreMetadata,
}

impl IndexedStore {
    /// Open the store at `path`, loading the existing snapshot if any
    ///
    /// A snapshot that is not valid JSON is moved aside and the store opens
    /// empty. Any other read failure is returned and the file is left alone.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let start = Instant::now();

        let (table, metadata) = match snapshot::read(&path) {
            Ok(Some(snapshot)) => (
                Table::from_customers(snapshot.customers),
                snapshot.metadata,
            ),
            Ok(None) => (Table::default(), StoreMetadata::default()),
            Err(e @ CustomerMapError::CorruptSnapshot { .. }) => {
                let moved = snapshot::quarantine(&path)?;
                warn!(
                    "Discarded unreadable store ({}); moved to {}",
                    e,
                    moved.display()
                );
                (Table::default(), StoreMetadata::default())
            }
            Err(e) => return Err(e),
        };

        info!(
            "Opened store {} with {} customers in {:?}",
            path.display(),
            table.records.len(),
            start.elapsed()
        );

        Ok(Self {
            path,
            table,
            metadata,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored customers
    pub fn count(&self) -> usize {
        self.table.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.records.is_empty()
    }

    pub fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    /// Rows in the source file before validation, if recorded
    pub fn original_record_count(&self) -> Option<usize> {
        self.metadata.original_record_count
    }

    /// Source rows that did not make it into the store
    pub fn excluded_count(&self) -> usize {
        self.original_record_count()
            .map(|original| original.saturating_sub(self.count()))
            .unwrap_or(0)
    }

    /// Upsert every customer in one atomic batch
    ///
    /// Returns the number of customers written. Existing records with the
    /// same account number are overwritten. The batch is staged on a copy of
    /// the whole table, so each call costs O(n) in the stored customers on
    /// top of the batch itself; prefer one large batch over many small ones.
    pub fn bulk_insert(&mut self, customers: Vec<Customer>) -> Result<usize> {
        let (pending, written) = self.stage_insert(customers)?;
        self.commit(pending)?;
        Ok(written)
    }

    /// Replace the entire dataset and its metadata in one atomic batch
    pub fn replace_all(
        &mut self,
        customers: Vec<Customer>,
        source: Option<String>,
        original_record_count: usize,
    ) -> Result<usize> {
        let (pending, stored) = self.stage_replace(customers, source, original_record_count)?;
        self.commit(pending)?;
        Ok(stored)
    }

    /// Remove every customer and the recorded metadata
    pub fn clear(&mut self) -> Result<()> {
        let pending = self.stage_clear()?;
        self.commit(pending)
    }

    pub(crate) fn stage_insert(&self, customers: Vec<Customer>) -> Result<(PendingCommit, usize)> {
        let written = customers.len();
        let mut staged = self.table.clone();
        for customer in customers {
            staged.upsert(customer);
        }

        let mut metadata = self.metadata.clone();
        metadata.updated_at = Some(Utc::now());

        let pending = PendingCommit::new(staged, metadata, CommitKind::Insert { written })?;
        Ok((pending, written))
    }

    pub(crate) fn stage_replace(
        &self,
        customers: Vec<Customer>,
        source: Option<String>,
        original_record_count: usize,
    ) -> Result<(PendingCommit, usize)> {
        let staged = Table::from_customers(customers);
        let stored = staged.records.len();
        let now = Utc::now();
        let metadata = StoreMetadata {
            source,
            original_record_count: Some(original_record_count),
            ingested_at: Some(now),
            updated_at: Some(now),
        };

        let kind = CommitKind::Replace {
            stored,
            original_record_count,
        };
        Ok((PendingCommit::new(staged, metadata, kind)?, stored))
    }

    pub(crate) fn stage_clear(&self) -> Result<PendingCommit> {
        PendingCommit::new(Table::default(), StoreMetadata::default(), CommitKind::Clear)
    }

    /// Swap in a staged batch whose snapshot is already on disk
    pub(crate) fn apply(&mut self, pending: PendingCommit) {
        match pending.kind {
            CommitKind::Insert { written } => {
                debug!("Bulk insert wrote {} customers", written)
            }
            CommitKind::Replace {
                stored,
                original_record_count,
            } => info!(
                "Replaced store contents: {} customers ({} source rows)",
                stored, original_record_count
            ),
            CommitKind::Clear => info!("Cleared customer store {}", self.path.display()),
        }
        self.table = pending.table;
        self.metadata = pending.metadata;
    }

    fn commit(&mut self, pending: PendingCommit) -> Result<()> {
        snapshot::write_bytes(&self.path, &pending.bytes)?;
        self.apply(pending);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum CommitKind {
    Insert {
        written: usize,
    },
    Replace {
        stored: usize,
        original_record_count: usize,
    },
    Clear,
}

/// A staged table with its encoded snapshot, not yet durable
#[derive(Debug)]
pub(crate) struct PendingCommit {
    table: Table,
    metadata: StoreMetadata,
    bytes: Vec<u8>,
    kind: CommitKind,
}

impl PendingCommit {
    fn new(table: Table, metadata: StoreMetadata, kind: CommitKind) -> Result<Self> {
        let bytes = snapshot::encode(&metadata, table.records.values())?;
        Ok(Self {
            table,
            metadata,
            bytes,
            kind,
        })
    }

    /// Take the encoded snapshot, leaving the staged table in place
    pub(crate) fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }
}

