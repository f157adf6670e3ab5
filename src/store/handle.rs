//! Lazily opened, shared handle to the customer store.
//!
//! The handle opens the store on first use and caches it for the lifetime
//! of the process. Concurrent first callers share one open. Reads take a
//! shared lock and writes an exclusive one, so readers never observe a
//! half-applied batch.

use super::{IndexedStore, Page, PendingCommit, StoreMetadata, snapshot};
use crate::error::{CustomerMapError, Result};
use crate::models::Customer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

/// Lifecycle of the store handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Closed,
    Opening,
    Open,
}

/// Async, process-wide access point for the indexed store
#[derive(Debug)]
pub struct StoreHandle {
    path: PathBuf,
    cell: OnceCell<RwLock<IndexedStore>>,
    opening: AtomicBool,
}

impl StoreHandle {
    /// Create a closed handle; nothing is read until the first operation
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
            opening: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> HandleState {
        if self.cell.initialized() {
            HandleState::Open
        } else if self.opening.load(Ordering::Acquire) {
            HandleState::Opening
        } else {
            HandleState::Closed
        }
    }

    /// Open the store if it is not open yet; idempotent
    pub async fn open(&self) -> Result<()> {
        self.store().await.map(|_| ())
    }

    async fn store(&self) -> Result<&RwLock<IndexedStore>> {
        if let Some(store) = self.cell.get() {
            return Ok(store);
        }

        self.opening.store(true, Ordering::Release);
        let result = self
            .cell
            .get_or_try_init(|| async {
                debug!("Opening customer store at {}", self.path.display());
                let path = self.path.clone();
                let store = tokio::task::spawn_blocking(move || IndexedStore::open(path))
                    .await
                    .map_err(|e| CustomerMapError::storage("store open task failed", e))??;
                Ok::<_, CustomerMapError>(RwLock::new(store))
            })
            .await;
        self.opening.store(false, Ordering::Release);
        result
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.store().await?.read().await.count())
    }

    pub async fn get(&self, accno: &str) -> Result<Option<Customer>> {
        Ok(self.store().await?.read().await.get(accno).cloned())
    }

    pub async fn get_slice(&self, limit: usize) -> Result<Vec<Customer>> {
        Ok(self.store().await?.read().await.get_slice(limit))
    }

    pub async fn page_after(&self, cursor: Option<&str>, limit: usize) -> Result<Page> {
        Ok(self.store().await?.read().await.page_after(cursor, limit))
    }

    /// Prefix search; `term` must already be lowercased
    pub async fn search(&self, term: &str, limit: usize) -> Result<Vec<Customer>> {
        Ok(self.store().await?.read().await.search(term, limit))
    }

    pub async fn find_near(
        &self,
        latitude: f64,
        longitude: f64,
        tolerance: f64,
    ) -> Result<Option<Customer>> {
        Ok(self
            .store()
            .await?
            .read()
            .await
            .find_near(latitude, longitude, tolerance)
            .cloned())
    }

    pub async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(self.store().await?.read().await.metadata().clone())
    }

    pub async fn original_record_count(&self) -> Result<Option<usize>> {
        Ok(self.store().await?.read().await.original_record_count())
    }

    pub async fn excluded_count(&self) -> Result<usize> {
        Ok(self.store().await?.read().await.excluded_count())
    }

    pub async fn bulk_insert(&self, customers: Vec<Customer>) -> Result<usize> {
        let store = self.store().await?;
        tokio::task::yield_now().await;
        let mut guard = store.write().await;
        let (pending, written) = guard.stage_insert(customers)?;
        Self::commit(&mut guard, pending).await?;
        drop(guard);
        tokio::task::yield_now().await;
        Ok(written)
    }

    /// Atomically swap the whole dataset and its recorded source
    pub async fn replace_all(
        &self,
        customers: Vec<Customer>,
        source: Option<String>,
        original_record_count: usize,
    ) -> Result<usize> {
        let store = self.store().await?;
        tokio::task::yield_now().await;
        let mut guard = store.write().await;
        let (pending, stored) =
            guard.stage_replace(customers, source, original_record_count)?;
        Self::commit(&mut guard, pending).await?;
        drop(guard);
        tokio::task::yield_now().await;
        Ok(stored)
    }

    pub async fn clear(&self) -> Result<()> {
        let store = self.store().await?;
        tokio::task::yield_now().await;
        let mut guard = store.write().await;
        let pending = guard.stage_clear()?;
        Self::commit(&mut guard, pending).await?;
        drop(guard);
        tokio::task::yield_now().await;
        Ok(())
    }

    /// Write the staged snapshot on the blocking pool, then swap it in
    ///
    /// The write lock is held throughout, so commits land in order and
    /// readers see either the old table or the new one.
    async fn commit(store: &mut IndexedStore, mut pending: PendingCommit) -> Result<()> {
        let path = store.path().to_path_buf();
        let bytes = pending.take_bytes();
        tokio::task::spawn_blocking(move || snapshot::write_bytes(&path, &bytes))
            .await
            .map_err(|e| CustomerMapError::storage("snapshot write task failed", e))??;
        store.apply(pending);
        Ok(())
    }
}
