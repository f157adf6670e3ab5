//! Core data structures for customer ingestion.
//!
//! Defines the ephemeral [`RawRow`] produced by the tabular parser and the
//! durable [`Customer`] record held by the indexed store.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One input record: header name to string value, in header order
///
/// All rows parsed from the same file share a single header list.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl RawRow {
    /// Create a row from a shared header list and its values
    ///
    /// Missing trailing values are filled with empty strings; surplus
    /// values are discarded.
    pub fn new(headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(headers.len(), String::new());
        Self { headers, values }
    }

    /// Header names in column order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Value at a column position
    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Value for an exact header name (first occurrence)
    pub fn get(&self, header: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|index| self.value_at(index))
    }

    /// Iterate over (header, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A validated utility customer with map coordinates
///
/// `accno` is the store's primary key. The lowercased account number is
/// derived data used by the prefix index and is recomputed on every insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub accno: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub tariff_code: String,
    #[serde(default)]
    pub kw_or_hp: String,
    #[serde(default)]
    pub consumer_status: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub meter_no: String,
    #[serde(default)]
    pub consumption: String,
    #[serde(default)]
    pub reading_month: String,
    #[serde(skip)]
    accno_lower: String,
}

impl Customer {
    /// Create a customer with empty descriptive fields
    pub fn new(
        accno: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        let accno = accno.into();
        let accno_lower = accno.to_lowercase();
        Self {
            accno,
            name: name.into(),
            latitude,
            longitude,
            tariff_code: String::new(),
            kw_or_hp: String::new(),
            consumer_status: String::new(),
            phase: String::new(),
            meter_no: String::new(),
            consumption: String::new(),
            reading_month: String::new(),
            accno_lower,
        }
    }

    /// Lowercased account number used for case-insensitive prefix search
    pub fn accno_lower(&self) -> &str {
        &self.accno_lower
    }

    /// Lowercased name used by the name index
    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }

    /// Recompute derived fields from the current account number
    pub(crate) fn refresh_derived(&mut self) {
        self.accno_lower = self.accno.to_lowercase();
    }

    /// Labelled fields shown in a marker popup or detail view
    pub fn detail_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Account No", self.accno.clone()),
            ("Tariff Code", self.tariff_code.clone()),
            ("KW/HP", self.kw_or_hp.clone()),
            ("Status", self.consumer_status.clone()),
            ("Phase", self.phase.clone()),
            ("Meter No", self.meter_no.clone()),
            ("Consumption", self.consumption.clone()),
            ("Reading Month", self.reading_month.clone()),
            (
                "Coordinates",
                format!("{:.6}, {:.6}", self.latitude, self.longitude),
            ),
        ]
    }
}
