//! Read paths over the indexed store.

use super::IndexedStore;
use crate::models::Customer;
use std::collections::HashSet;
use std::ops::Bound;

/// One page of customers in primary-key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub customers: Vec<Customer>,
    /// Account number to resume after; `None` on the last page
    pub next_cursor: Option<String>,
}

impl IndexedStore {
    /// Customer with exactly this account number
    pub fn get(&self, accno: &str) -> Option<&Customer> {
        self.table.records.get(accno)
    }

    /// First `limit` customers in primary-key order
    pub fn get_slice(&self, limit: usize) -> Vec<Customer> {
        self.table.records.values().take(limit).cloned().collect()
    }

    /// Up to `limit` customers strictly after `cursor`
    pub fn page_after(&self, cursor: Option<&str>, limit: usize) -> Page {
        let lower = match cursor {
            Some(accno) => Bound::Excluded(accno),
            None => Bound::Unbounded,
        };
        let mut customers: Vec<Customer> = self
            .table
            .records
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit.saturating_add(1))
            .map(|(_, customer)| customer.clone())
            .collect();

        let next_cursor = if limit > 0 && customers.len() > limit {
            customers.truncate(limit);
            customers.last().map(|c| c.accno.clone())
        } else {
            None
        };

        Page {
            customers,
            next_cursor,
        }
    }

    /// Prefix search over account numbers, then names
    ///
    /// `term` must already be lowercased. Account-number matches come first
    /// in index order, followed by name matches not already returned; the
    /// result never exceeds `limit`.
    pub fn search(&self, term: &str, limit: usize) -> Vec<Customer> {
        let mut results: Vec<Customer> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for accno in self.table.accno_index.prefix_scan(term) {
            if results.len() >= limit {
                break;
            }
            if let Some(customer) = self.table.records.get(accno) {
                seen.insert(accno);
                results.push(customer.clone());
            }
        }

        if results.len() < limit {
            for accno in self.table.name_index.prefix_scan(term) {
                if results.len() >= limit {
                    break;
                }
                if seen.contains(accno) {
                    continue;
                }
                if let Some(customer) = self.table.records.get(accno) {
                    seen.insert(accno);
                    results.push(customer.clone());
                }
            }
        }

        results
    }

    /// First customer, in primary-key order, within `tolerance` degrees of
    /// the given point on both axes
    pub fn find_near(&self, latitude: f64, longitude: f64, tolerance: f64) -> Option<&Customer> {
        self.table.records.values().find(|customer| {
            (customer.latitude - latitude).abs() <= tolerance
                && (customer.longitude - longitude).abs() <= tolerance
        })
    }
}
