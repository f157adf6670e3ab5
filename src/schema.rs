//! Logical column resolution.
//!
//! Input files name their columns inconsistently ("AccNo", "Consumer Name",
//! "LONGITUDE (deg)"). A logical field resolves to the first header, in
//! header order, whose lowercased and trimmed form contains the field's
//! lowercased logical name. Ambiguous headers are never ranked; the first
//! match wins.

use crate::config::ColumnNames;
use crate::error::{CustomerMapError, Result};
use crate::models::RawRow;
use tracing::debug;

/// Fields a customer record is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    AccountNumber,
    Name,
    Longitude,
    Latitude,
    TariffCode,
    KwOrHp,
    ConsumerStatus,
    Phase,
    MeterNo,
    Consumption,
    ReadingMonth,
}

impl LogicalField {
    /// Fields every input file must provide
    pub const REQUIRED: [LogicalField; 4] = [
        LogicalField::AccountNumber,
        LogicalField::Name,
        LogicalField::Longitude,
        LogicalField::Latitude,
    ];

    pub const ALL: [LogicalField; 11] = [
        LogicalField::AccountNumber,
        LogicalField::Name,
        LogicalField::Longitude,
        LogicalField::Latitude,
        LogicalField::TariffCode,
        LogicalField::KwOrHp,
        LogicalField::ConsumerStatus,
        LogicalField::Phase,
        LogicalField::MeterNo,
        LogicalField::Consumption,
        LogicalField::ReadingMonth,
    ];

    fn position(self) -> usize {
        self as usize
    }
}

/// Resolves logical fields to header names using configured column names
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    names: ColumnNames,
}

impl SchemaResolver {
    pub fn new(names: ColumnNames) -> Self {
        Self { names }
    }

    /// Configured logical name for a field
    pub fn logical_name(&self, field: LogicalField) -> &str {
        let names = &self.names;
        match field {
            LogicalField::AccountNumber => &names.accno,
            LogicalField::Name => &names.name,
            LogicalField::Longitude => &names.longitude,
            LogicalField::Latitude => &names.latitude,
            LogicalField::TariffCode => &names.tariff_code,
            LogicalField::KwOrHp => &names.kw_or_hp,
            LogicalField::ConsumerStatus => &names.consumer_status,
            LogicalField::Phase => &names.phase,
            LogicalField::MeterNo => &names.meter_no,
            LogicalField::Consumption => &names.consumption,
            LogicalField::ReadingMonth => &names.reading_month,
        }
    }

    /// Value of a logical field in a row, trimmed; empty when unresolved
    pub fn resolve<'r>(&self, row: &'r RawRow, field: LogicalField) -> &'r str {
        find_header_index(row.headers(), self.logical_name(field))
            .and_then(|index| row.value_at(index))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Check the required fields against a header list and fix the column
    /// position of every field
    ///
    /// Fails with every unresolved required logical name.
    pub fn resolve_columns(&self, headers: &[String]) -> Result<ColumnSchema> {
        let mut indices = [None; LogicalField::ALL.len()];
        for field in LogicalField::ALL {
            indices[field.position()] = find_header_index(headers, self.logical_name(field));
        }

        let missing: Vec<String> = LogicalField::REQUIRED
            .iter()
            .filter(|field| indices[field.position()].is_none())
            .map(|field| self.logical_name(*field).to_string())
            .collect();

        if !missing.is_empty() {
            return Err(CustomerMapError::MissingColumns { missing });
        }

        let schema = ColumnSchema { indices };
        for field in LogicalField::ALL {
            if let Some(header) = schema.index(field).and_then(|i| headers.get(i)) {
                debug!("Resolved {:?} to column '{}'", field, header);
            }
        }
        Ok(schema)
    }
}

impl Default for SchemaResolver {
    fn default() -> Self {
        Self::new(ColumnNames::default())
    }
}

/// Column positions fixed once per file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    indices: [Option<usize>; LogicalField::ALL.len()],
}

impl ColumnSchema {
    /// Column position of a field, if the file has it
    pub fn index(&self, field: LogicalField) -> Option<usize> {
        self.indices[field.position()]
    }

    /// Value of a field in a row, trimmed; empty when the column is absent
    pub fn value<'r>(&self, row: &'r RawRow, field: LogicalField) -> &'r str {
        self.index(field)
            .and_then(|index| row.value_at(index))
            .map(str::trim)
            .unwrap_or("")
    }
}

/// First header whose lowercased, trimmed form contains `logical_name`
pub fn find_header_index(headers: &[String], logical_name: &str) -> Option<usize> {
    let needle = logical_name.to_lowercase();
    headers
        .iter()
        .position(|header| header.trim().to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn row(headers: &[&str], values: &[&str]) -> RawRow {
        let headers: Arc<[String]> = headers.iter().map(|s| s.to_string()).collect();
        RawRow::new(headers, values.iter().map(|s| s.to_string()).collect())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let headers = strings(&["Consumer AccNo", " NAME ", "Longitude (deg)", "LATTITUDE"]);
        assert_eq!(find_header_index(&headers, "accno"), Some(0));
        assert_eq!(find_header_index(&headers, "name"), Some(1));
        assert_eq!(find_header_index(&headers, "longitude"), Some(2));
        assert_eq!(find_header_index(&headers, "lattitude"), Some(3));
        assert_eq!(find_header_index(&headers, "phase"), None);
    }

    #[test]
    fn test_first_match_in_header_order_wins() {
        let headers = strings(&["longitude_raw", "longitude"]);
        assert_eq!(find_header_index(&headers, "longitude"), Some(0));
    }

    #[test]
    fn test_resolve_trims_and_defaults_to_empty() {
        let resolver = SchemaResolver::default();
        let row = row(&["AccNo", "Name"], &["  A1 ", "Jane"]);

        assert_eq!(resolver.resolve(&row, LogicalField::AccountNumber), "A1");
        assert_eq!(resolver.resolve(&row, LogicalField::Name), "Jane");
        assert_eq!(resolver.resolve(&row, LogicalField::Phase), "");
    }

    #[test]
    fn test_resolve_columns_reports_all_missing_fields() {
        let resolver = SchemaResolver::default();
        let error = resolver
            .resolve_columns(&strings(&["accno", "longitude", "latitude"]))
            .unwrap_err();

        match error {
            CustomerMapError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["name", "lattitude"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_columns_fixes_optional_positions() {
        let resolver = SchemaResolver::default();
        let headers = strings(&["accno", "name", "longitude", "lattitude", "Meter No", "MeterNo"]);
        let schema = resolver.resolve_columns(&headers).unwrap();

        assert_eq!(schema.index(LogicalField::Latitude), Some(3));
        assert_eq!(schema.index(LogicalField::MeterNo), Some(5));
        assert_eq!(schema.index(LogicalField::TariffCode), None);

        let row = row(&headers.iter().map(String::as_str).collect::<Vec<_>>(), &[
            "A1", "X", "10", "20", "ignored", " M-9 ",
        ]);
        assert_eq!(schema.value(&row, LogicalField::MeterNo), "M-9");
        assert_eq!(schema.value(&row, LogicalField::TariffCode), "");
    }

    #[test]
    fn test_custom_column_names() {
        let names = ColumnNames {
            latitude: "Latitude".to_string(),
            ..ColumnNames::default()
        };
        let resolver = SchemaResolver::new(names);
        let schema = resolver
            .resolve_columns(&strings(&["accno", "name", "longitude", "latitude"]))
            .unwrap();
        assert_eq!(schema.index(LogicalField::Latitude), Some(3));
    }
}
