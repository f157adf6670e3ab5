//! Tests for the indexed customer store
//!
//! Covers slice and search ordering, upsert and clear semantics, snapshot
//! persistence across reopen, and the async handle lifecycle.


use crate::models::Customer;

/// Customer at a fixed point with no optional fields
pub(crate) fn customer(accno: &str, name: &str) -> Customer {
    Customer::new(accno, name, 24.5, 73.7)
}

pub(crate) fn accnos(customers: &[Customer]) -> Vec<&str> {
    customers.iter().map(|c| c.accno.as_str()).collect()
}
