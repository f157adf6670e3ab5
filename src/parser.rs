//! Tabular input parsing.
//!
//! Turns delimited text or the first sheet of a spreadsheet into an ordered
//! sequence of [`RawRow`]s keyed by the header row. Parsing is tolerant:
//! blank lines are skipped and lines whose field count does not match the
//! header are dropped instead of failing the file.

use crate::constants::{DELIMITED_EXTENSIONS, SPREADSHEET_EXTENSIONS};
use crate::error::{CustomerMapError, Result};
use crate::models::RawRow;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Supported input encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated text with double-quote escaping
    Delimited,
    /// Workbook; only the first sheet is read
    Spreadsheet,
}

impl InputFormat {
    /// Detect the input format from a file name's extension
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Delimited)
        } else if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::Spreadsheet)
        } else {
            Err(CustomerMapError::UnsupportedFormat {
                file_name: file_name.to_string(),
            })
        }
    }
}

/// Raw input handed to the parser
#[derive(Debug, Clone)]
pub enum TabularInput {
    Delimited(String),
    Spreadsheet(Vec<u8>),
}

impl TabularInput {
    /// Wrap file contents according to the file name's format
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Self> {
        match InputFormat::from_file_name(file_name)? {
            InputFormat::Delimited => {
                let text = String::from_utf8_lossy(&bytes);
                let text = text.strip_prefix('\u{feff}').unwrap_or(&*text);
                Ok(Self::Delimited(text.to_string()))
            }
            InputFormat::Spreadsheet => Ok(Self::Spreadsheet(bytes)),
        }
    }

    pub fn format(&self) -> InputFormat {
        match self {
            Self::Delimited(_) => InputFormat::Delimited,
            Self::Spreadsheet(_) => InputFormat::Spreadsheet,
        }
    }
}

/// Parsed rows with the header they share
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub headers: Arc<[String]>,
    pub rows: Vec<RawRow>,
    /// Data lines dropped because their field count did not match the header
    pub malformed_lines: usize,
}

/// Parser for delimited text and spreadsheets
#[derive(Debug, Default, Clone, Copy)]
pub struct TabularParser;

impl TabularParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an input into rows
    pub fn parse(&self, input: &TabularInput) -> Result<ParsedTable> {
        let table = match input {
            TabularInput::Delimited(text) => {
                let mut rows = DelimitedRows::new(text);
                let parsed: Vec<RawRow> = rows.by_ref().collect();
                ParsedTable {
                    headers: rows.headers.clone(),
                    rows: parsed,
                    malformed_lines: rows.malformed_lines,
                }
            }
            TabularInput::Spreadsheet(bytes) => parse_spreadsheet(bytes)?,
        };

        info!(
            "Parsed {} rows ({} columns, {} malformed lines dropped)",
            table.rows.len(),
            table.headers.len(),
            table.malformed_lines
        );
        Ok(table)
    }
}

/// Lazy iterator over the data rows of delimited text
///
/// The header is read eagerly on construction. The iterator is consumed as
/// it goes; parse the text again to restart.
#[derive(Debug)]
pub struct DelimitedRows<'a> {
    headers: Arc<[String]>,
    lines: std::str::Split<'a, char>,
    malformed_lines: usize,
}

impl<'a> DelimitedRows<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = text.split('\n');
        let header_line = lines.next().unwrap_or_default();
        let headers: Arc<[String]> = header_line
            .split(',')
            .map(|header| header.trim().replace('"', ""))
            .collect();

        Self {
            headers,
            lines,
            malformed_lines: 0,
        }
    }

    pub fn headers(&self) -> &Arc<[String]> {
        &self.headers
    }

    /// Lines dropped so far because of a field count mismatch
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }
}

impl Iterator for DelimitedRows<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        for line in self.lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let values = split_quoted_line(line);
            if values.len() != self.headers.len() {
                self.malformed_lines += 1;
                debug!(
                    "Dropping line with {} fields (expected {})",
                    values.len(),
                    self.headers.len()
                );
                continue;
            }

            let values = values.into_iter().map(|v| v.trim().to_string()).collect();
            return Some(RawRow::new(self.headers.clone(), values));
        }
        None
    }
}

/// Split one line on commas that are outside double-quoted spans
///
/// Every `"` toggles the quoted state and is removed from the output, so
/// `""` inside a quoted span produces nothing rather than a literal quote.
pub fn split_quoted_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Decode the first sheet of a workbook into rows keyed by its first row
fn parse_spreadsheet(bytes: &[u8]) -> Result<ParsedTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| CustomerMapError::spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CustomerMapError::spreadsheet("workbook has no worksheets"))?
        .map_err(|e| CustomerMapError::spreadsheet(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(ParsedTable {
            headers: Arc::from(Vec::new()),
            rows: Vec::new(),
            malformed_lines: 0,
        });
    };

    let headers: Arc<[String]> = header_row
        .iter()
        .map(|cell| cell_to_string(cell).trim().to_string())
        .collect();

    let rows = sheet_rows
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| RawRow::new(headers.clone(), cells.iter().map(cell_to_string).collect()))
        .collect();

    Ok(ParsedTable {
        headers,
        rows,
        malformed_lines: 0,
    })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_comma_stays_in_field() {
        assert_eq!(
            split_quoted_line(r#"123,"Doe, Jane",1.0,2.0"#),
            vec!["123", "Doe, Jane", "1.0", "2.0"]
        );
    }

    #[test]
    fn test_quotes_are_stripped() {
        assert_eq!(
            split_quoted_line(r#""A1","say ""hi""",3"#),
            vec!["A1", "say hi", "3"]
        );
        assert_eq!(split_quoted_line(""), vec![""]);
        assert_eq!(split_quoted_line("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_delimited_rows_skip_blank_and_malformed_lines() {
        let text = "accno, \"name\" ,longitude,lattitude\r\n\
                    A1,X,10,20\r\n\
                    \r\n\
                    A2,Y,10\r\n\
                    A3,\"Z, Co\",11,21\n";
        let mut rows = DelimitedRows::new(text);
        assert_eq!(
            &rows.headers()[..],
            ["accno", "name", "longitude", "lattitude"]
        );

        let first = rows.next().unwrap();
        assert_eq!(first.get("accno"), Some("A1"));
        assert_eq!(first.get("lattitude"), Some("20"));

        let second = rows.next().unwrap();
        assert_eq!(second.get("name"), Some("Z, Co"));

        assert!(rows.next().is_none());
        assert_eq!(rows.malformed_lines(), 1);
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut rows = DelimitedRows::new("a,b\n  x , \" y \" ");
        let row = rows.next().unwrap();
        assert_eq!(row.get("a"), Some("x"));
        assert_eq!(row.get("b"), Some("y"));
    }

    #[test]
    fn test_header_only_text_yields_no_rows() {
        let table = TabularParser::new()
            .parse(&TabularInput::Delimited("accno,name\n".to_string()))
            .unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_input_format_detection() {
        assert_eq!(
            InputFormat::from_file_name("customers.CSV").unwrap(),
            InputFormat::Delimited
        );
        assert_eq!(
            InputFormat::from_file_name("book.xlsx").unwrap(),
            InputFormat::Spreadsheet
        );
        assert!(matches!(
            InputFormat::from_file_name("notes.txt"),
            Err(CustomerMapError::UnsupportedFormat { .. })
        ));
        assert!(InputFormat::from_file_name("noextension").is_err());
    }

    #[test]
    fn test_from_bytes_strips_bom() {
        let input =
            TabularInput::from_bytes("a.csv", "\u{feff}accno,name\nA1,X".as_bytes().to_vec())
                .unwrap();
        let table = TabularParser::new().parse(&input).unwrap();
        assert_eq!(table.headers[0], "accno");
        assert_eq!(table.rows.len(), 1);
    }

    const WORKBOOK: &[u8] = include_bytes!("../tests/fixtures/customers.xlsx");

    #[test]
    fn test_spreadsheet_reads_first_sheet_keyed_by_header_row() {
        let input = TabularInput::from_bytes("customers.xlsx", WORKBOOK.to_vec()).unwrap();
        assert_eq!(input.format(), InputFormat::Spreadsheet);

        let table = TabularParser::new().parse(&input).unwrap();

        assert_eq!(
            &*table.headers,
            &["AccNo", "Name", "Longitude", "Lattitude"].map(String::from)
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.malformed_lines, 0);

        // Numeric cells render without a trailing ".0"
        let first: Vec<_> = table.rows[0].iter().collect();
        assert_eq!(
            first,
            vec![
                ("AccNo", "12345"),
                ("Name", "Jane"),
                ("Longitude", "73.5"),
                ("Lattitude", "0"),
            ]
        );

        // Missing cell in the middle of a row reads as empty
        assert_eq!(table.rows[1].get("Name"), Some(""));
        assert_eq!(table.rows[1].get("AccNo"), Some("67890"));
    }

    #[test]
    fn test_garbage_spreadsheet_is_reported() {
        let input = TabularInput::Spreadsheet(b"not a workbook".to_vec());
        let error = TabularParser::new().parse(&input).unwrap_err();
        assert!(matches!(error, CustomerMapError::Spreadsheet { .. }));
    }
}
