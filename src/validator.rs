//! Per-record validation and projection into [`Customer`] records.
//!
//! A row is valid when it has an account number, a name and two in-range
//! coordinates. Invalid rows produce a [`Rejection`] listing every failed
//! condition; rejections are diagnostics and never abort ingestion.

use crate::constants::{LATITUDE_MAX, LATITUDE_MIN, LONGITUDE_MAX, LONGITUDE_MIN};
use crate::models::{Customer, RawRow};
use crate::schema::{ColumnSchema, LogicalField};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Leading decimal number, optionally signed, with optional exponent
static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("numeric prefix pattern is valid")
});

/// Parse the leading numeric prefix of a string, ignoring trailing text
///
/// `"12.5abc"` parses as `12.5`; `"abc"` and `""` do not parse.
pub fn parse_numeric_prefix(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    NUMERIC_PREFIX
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Whether a raw value is a finite number within `[min, max]`
///
/// An empty value is invalid; `"0"` is a valid coordinate.
pub fn is_valid_coordinate(value: &str, min: f64, max: f64) -> bool {
    if value.is_empty() {
        return false;
    }
    match parse_numeric_prefix(value) {
        Some(number) => number.is_finite() && number >= min && number <= max,
        None => false,
    }
}

/// One failed validation condition
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    MissingAccountNumber,
    MissingName,
    InvalidLongitude(String),
    InvalidLatitude(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAccountNumber => write!(f, "missing account number"),
            Self::MissingName => write!(f, "missing name"),
            Self::InvalidLongitude(raw) => write!(f, "invalid longitude ({})", raw),
            Self::InvalidLatitude(raw) => write!(f, "invalid latitude ({})", raw),
        }
    }
}

/// A row that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Zero-based position of the row among parsed data rows
    pub row_index: usize,
    pub accno: String,
    pub name: String,
    pub reasons: Vec<RejectionReason>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accno = if self.accno.is_empty() { "NO_ACCNO" } else { &self.accno };
        let name = if self.name.is_empty() { "NO_NAME" } else { &self.name };
        let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
        write!(
            f,
            "row {}: {} - {} | {}",
            self.row_index + 1,
            accno,
            name,
            reasons.join(", ")
        )
    }
}

/// Validates rows against a resolved column schema
#[derive(Debug, Clone)]
pub struct RecordValidator {
    schema: ColumnSchema,
}

impl RecordValidator {
    pub fn new(schema: ColumnSchema) -> Self {
        Self { schema }
    }

    /// Validate one row, producing a customer or a rejection
    pub fn validate(&self, row: &RawRow, row_index: usize) -> Result<Customer, Rejection> {
        let schema = &self.schema;
        let accno = schema.value(row, LogicalField::AccountNumber);
        let name = schema.value(row, LogicalField::Name);
        let longitude = schema.value(row, LogicalField::Longitude);
        let latitude = schema.value(row, LogicalField::Latitude);

        let mut reasons = Vec::new();
        if accno.is_empty() {
            reasons.push(RejectionReason::MissingAccountNumber);
        }
        if name.is_empty() {
            reasons.push(RejectionReason::MissingName);
        }
        let lon = coordinate(longitude, LONGITUDE_MIN, LONGITUDE_MAX);
        if lon.is_none() {
            reasons.push(RejectionReason::InvalidLongitude(longitude.to_string()));
        }
        let lat = coordinate(latitude, LATITUDE_MIN, LATITUDE_MAX);
        if lat.is_none() {
            reasons.push(RejectionReason::InvalidLatitude(latitude.to_string()));
        }

        match (lon, lat) {
            (Some(longitude), Some(latitude)) if reasons.is_empty() => {
                let mut customer = Customer::new(accno, name, latitude, longitude);
                customer.tariff_code = schema.value(row, LogicalField::TariffCode).to_string();
                customer.kw_or_hp = schema.value(row, LogicalField::KwOrHp).to_string();
                customer.consumer_status =
                    schema.value(row, LogicalField::ConsumerStatus).to_string();
                customer.phase = schema.value(row, LogicalField::Phase).to_string();
                customer.meter_no = schema.value(row, LogicalField::MeterNo).to_string();
                customer.consumption = schema.value(row, LogicalField::Consumption).to_string();
                customer.reading_month = schema.value(row, LogicalField::ReadingMonth).to_string();
                Ok(customer)
            }
            _ => Err(Rejection {
                row_index,
                accno: accno.to_string(),
                name: name.to_string(),
                reasons,
            }),
        }
    }
}

fn coordinate(value: &str, min: f64, max: f64) -> Option<f64> {
    if is_valid_coordinate(value, min, max) {
        parse_numeric_prefix(value)
    } else {
        None
    }
}
