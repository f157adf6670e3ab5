//! Ordered secondary indexes over the customer table.

use crate::constants::PREFIX_SENTINEL;
use std::collections::BTreeSet;
use std::ops::Bound;

/// Non-unique index mapping a key to primary keys, ordered by (key, accno)
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    entries: BTreeSet<(String, String)>,
}

impl SecondaryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, accno: String) {
        self.entries.insert((key, accno));
    }

    pub fn remove(&mut self, key: &str, accno: &str) -> bool {
        self.entries.remove(&(key.to_string(), accno.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Primary keys whose index key falls in `[prefix, prefix + sentinel)`,
    /// in index order
    pub fn prefix_scan<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a str> + 'a {
        let lower = (prefix.to_string(), String::new());
        let upper = (format!("{}{}", prefix, PREFIX_SENTINEL), String::new());
        self.entries
            .range((Bound::Included(lower), Bound::Excluded(upper)))
            .map(|(_, accno)| accno.as_str())
    }
}
