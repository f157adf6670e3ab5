//! Application context owning the configuration, store handle and
//! selection state.

use crate::config::Config;
use crate::error::Result;
use crate::models::Customer;
use crate::processor::{IngestReport, Ingestor, ProgressSink};
use crate::query::{FocusSink, QueryFacade};
use crate::store::StoreHandle;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Everything a front end needs to ingest and browse customers
#[derive(Debug)]
pub struct AppContext {
    config: Config,
    store: Arc<StoreHandle>,
    ingestor: Ingestor,
    query: QueryFacade,
    selection: Option<String>,
}

impl AppContext {
    /// Build a context from a validated configuration; the store opens on
    /// first use
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(StoreHandle::new(config.store_path()?));
        let ingestor = Ingestor::new(&config);
        let query = QueryFacade::new(Arc::clone(&store), &config.query);
        Ok(Self {
            config,
            store,
            ingestor,
            query,
            selection: None,
        })
    }

    pub fn with_focus_sink(mut self, sink: impl FocusSink) -> Self {
        self.query = self.query.with_focus_sink(sink);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn query(&self) -> &QueryFacade {
        &self.query
    }

    /// Ingest a file, replacing the dataset; clears the selection on success
    pub async fn ingest_path(
        &mut self,
        path: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<IngestReport> {
        let report = self.ingestor.ingest_path(path, &self.store, progress).await?;
        self.selection = None;
        Ok(report)
    }

    /// Ingest in-memory file contents; clears the selection on success
    pub async fn ingest_bytes(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        progress: &dyn ProgressSink,
    ) -> Result<IngestReport> {
        let report = self
            .ingestor
            .ingest(file_name, bytes, &self.store, progress)
            .await?;
        self.selection = None;
        Ok(report)
    }

    /// Select a customer by account number; unknown numbers clear the
    /// selection
    pub async fn select(&mut self, accno: &str) -> Result<Option<Customer>> {
        let customer = self.store.get(accno).await?;
        self.selection = customer.as_ref().map(|c| c.accno.clone());
        debug!("Selection is now {:?}", self.selection);
        Ok(customer)
    }

    /// Currently selected customer, if it is still stored
    pub async fn selected(&self) -> Result<Option<Customer>> {
        match &self.selection {
            Some(accno) => self.store.get(accno).await,
            None => Ok(None),
        }
    }

    pub fn selected_accno(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Remove every customer and forget the selection
    pub async fn clear(&mut self) -> Result<()> {
        self.query.clear().await?;
        self.selection = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::NoProgress;
    use tempfile::TempDir;

    const CSV: &[u8] = b"accno,name,longitude,lattitude\nA1,Alice,73.7,24.5\nB2,Bob,73.8,24.6\n";

    fn context(temp_dir: &TempDir) -> AppContext {
        let config = Config::default().with_store_path(temp_dir.path().join("store.json"));
        AppContext::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_selection_follows_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(&temp_dir);
        ctx.ingest_bytes("c.csv", CSV.to_vec(), &NoProgress).await.unwrap();

        let selected = ctx.select("B2").await.unwrap();
        assert_eq!(selected.map(|c| c.name), Some("Bob".to_string()));
        assert_eq!(ctx.selected_accno(), Some("B2"));

        assert!(ctx.select("ZZ").await.unwrap().is_none());
        assert_eq!(ctx.selected_accno(), None);
    }

    #[tokio::test]
    async fn test_clear_resets_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = context(&temp_dir);
        ctx.ingest_bytes("c.csv", CSV.to_vec(), &NoProgress).await.unwrap();
        ctx.select("A1").await.unwrap();

        ctx.clear().await.unwrap();

        assert_eq!(ctx.selected_accno(), None);
        assert!(ctx.selected().await.unwrap().is_none());
        assert_eq!(ctx.query().count().await.unwrap(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config::default().with_page_size(0);
        assert!(AppContext::new(config).is_err());
    }
}
