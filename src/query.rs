//! Renderer-facing reads over the customer store.
//!
//! [`QueryFacade`] serves the first page, search pages and cursor pages at
//! configured sizes. When a search yields exactly one customer it schedules
//! an auto-focus on that customer after a short delay; a newer search or a
//! clear cancels any focus still pending.

use crate::config::QueryConfig;
use crate::constants::DEFAULT_LOCATE_TOLERANCE;
use crate::error::Result;
use crate::models::Customer;
use crate::store::{Page, StoreHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Receiver of auto-focus requests, typically a map renderer
pub trait FocusSink: Send + Sync + 'static {
    fn focus(&self, customer: &Customer);
}

impl<F> FocusSink for F
where
    F: Fn(&Customer) + Send + Sync + 'static,
{
    fn focus(&self, customer: &Customer) {
        self(customer)
    }
}

/// Focus sink that ignores requests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocus;

impl FocusSink for NoFocus {
    fn focus(&self, _customer: &Customer) {}
}

pub struct QueryFacade {
    store: Arc<StoreHandle>,
    page_size: usize,
    render_batch_size: usize,
    focus_delay: Duration,
    focus: Arc<dyn FocusSink>,
    pending_focus: Mutex<Option<JoinHandle<()>>>,
}

impl QueryFacade {
    pub fn new(store: Arc<StoreHandle>, config: &QueryConfig) -> Self {
        Self {
            store,
            page_size: config.page_size,
            render_batch_size: config.render_batch_size,
            focus_delay: config.focus_delay(),
            focus: Arc::new(NoFocus),
            pending_focus: Mutex::new(None),
        }
    }

    /// Route auto-focus requests to `sink`
    pub fn with_focus_sink(mut self, sink: impl FocusSink) -> Self {
        self.focus = Arc::new(sink);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// First page of customers in account-number order
    pub async fn initial_page(&self) -> Result<Vec<Customer>> {
        self.store.get_slice(self.page_size).await
    }

    /// Search by account-number or name prefix
    ///
    /// The term is trimmed and lowercased; an empty term returns the
    /// initial page.
    pub async fn search_page(&self, term: &str) -> Result<Vec<Customer>> {
        let term = term.trim().to_lowercase();
        self.cancel_focus().await;

        if term.is_empty() {
            return self.initial_page().await;
        }

        let results = self.store.search(&term, self.page_size).await?;
        debug!("Search '{}' matched {} customers", term, results.len());

        if let [only] = results.as_slice() {
            self.schedule_focus(only.clone()).await;
        }
        Ok(results)
    }

    /// Next render batch after `cursor`, or the first batch when `None`
    pub async fn next_page(&self, cursor: Option<&str>) -> Result<Page> {
        self.store.page_after(cursor, self.render_batch_size).await
    }

    pub async fn get(&self, accno: &str) -> Result<Option<Customer>> {
        self.store.get(accno).await
    }

    /// Customer within `tolerance` degrees of a point (default 0.0001)
    pub async fn locate(
        &self,
        latitude: f64,
        longitude: f64,
        tolerance: Option<f64>,
    ) -> Result<Option<Customer>> {
        let tolerance = tolerance.unwrap_or(DEFAULT_LOCATE_TOLERANCE);
        self.store.find_near(latitude, longitude, tolerance).await
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    pub async fn excluded_count(&self) -> Result<usize> {
        self.store.excluded_count().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.cancel_focus().await;
        self.store.clear().await
    }

    /// Wait for a pending auto-focus to fire; returns false if none was
    /// pending or it was cancelled
    pub async fn wait_for_focus(&self) -> bool {
        let pending = self.pending_focus.lock().await.take();
        match pending {
            Some(handle) => handle.await.is_ok(),
            None => false,
        }
    }

    async fn schedule_focus(&self, customer: Customer) {
        let sink = Arc::clone(&self.focus);
        let delay = self.focus_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!("Auto-focusing customer {}", customer.accno);
            sink.focus(&customer);
        });
        if let Some(previous) = self.pending_focus.lock().await.replace(handle) {
            previous.abort();
        }
    }

    async fn cancel_focus(&self) {
        if let Some(previous) = self.pending_focus.lock().await.take() {
            previous.abort();
        }
    }
}

impl std::fmt::Debug for QueryFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFacade")
            .field("page_size", &self.page_size)
            .field("render_batch_size", &self.render_batch_size)
            .field("focus_delay", &self.focus_delay)
            .finish_non_exhaustive()
    }
}
