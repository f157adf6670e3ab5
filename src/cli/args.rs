//! Command-line argument definitions for the customer map tool
//!
//! Defines the CLI surface with the clap derive API: one subcommand per
//! store operation plus global options for the store location, config
//! file, verbosity and JSON output.

use crate::constants::DEFAULT_LOCATE_TOLERANCE;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the customer map tool
///
/// Ingests a customer spreadsheet with coordinates into an indexed store
/// and answers list, search and lookup queries against it.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "customer-map",
    version,
    about = "Ingest utility customer spreadsheets into a searchable, map-ready store",
    long_about = "Reads a CSV file or the first sheet of a spreadsheet describing utility \
                  customers with coordinates, validates every row, and keeps the valid \
                  customers in a persistent store indexed by account number and name. \
                  The store can then be listed page by page, searched by prefix, or \
                  queried for a single customer."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the store snapshot file
    ///
    /// Defaults to the platform data directory, e.g.
    /// ~/.local/share/customer-map/store.json
    #[arg(
        long = "store",
        value_name = "FILE",
        global = true,
        help = "Path to the store snapshot file"
    )]
    pub store_path: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// ~/.config/customer-map/config.toml
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[arg(
        long = "json",
        global = true,
        help = "Print query results as JSON"
    )]
    pub json: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Ingest a CSV or spreadsheet file, replacing the stored customers
    Ingest(IngestArgs),
    /// List stored customers in account-number order
    List(ListArgs),
    /// Search customers by account-number or name prefix
    Search(SearchArgs),
    /// Show every field of one customer
    Show(ShowArgs),
    /// Print the number of stored and excluded customers
    Count,
    /// Find the customer at a coordinate
    Locate(LocateArgs),
    /// Remove every stored customer
    Clear(ClearArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct IngestArgs {
    /// Input file (.csv, .xlsx, .xlsm, .xlsb, .xls, .ods)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[arg(long = "show-rejections", help = "List every rejected row with its reasons")]
    pub show_rejections: bool,

    #[arg(
        long = "chunk-size",
        value_name = "ROWS",
        help = "Rows validated per chunk"
    )]
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ListArgs {
    #[arg(
        short = 'n',
        long = "limit",
        value_name = "COUNT",
        help = "Number of customers to list (defaults to the page size)"
    )]
    pub limit: Option<usize>,

    #[arg(
        long = "all",
        conflicts_with = "limit",
        help = "Stream every customer in render batches"
    )]
    pub all: bool,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SearchArgs {
    /// Account-number or name prefix; case-insensitive
    #[arg(value_name = "TERM")]
    pub term: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ShowArgs {
    /// Exact account number
    #[arg(value_name = "ACCNO")]
    pub accno: String,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct LocateArgs {
    #[arg(value_name = "LAT", allow_negative_numbers = true)]
    pub latitude: f64,

    #[arg(value_name = "LON", allow_negative_numbers = true)]
    pub longitude: f64,

    #[arg(
        long = "tolerance",
        value_name = "DEGREES",
        default_value_t = DEFAULT_LOCATE_TOLERANCE,
        help = "Maximum distance in degrees on each axis"
    )]
    pub tolerance: f64,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ClearArgs {
    #[arg(short = 'y', long = "yes", help = "Skip the confirmation prompt")]
    pub yes: bool,
}

impl Args {
    /// Log level requested on the command line, if any
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else {
            match self.verbose {
                0 => None,
                1 => Some("info"),
                2 => Some("debug"),
                _ => Some("trace"),
            }
        }
    }

    /// Progress bars are hidden in quiet and JSON modes
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest_with_global_options() {
        let args = Args::try_parse_from([
            "customer-map",
            "--store",
            "/tmp/s.json",
            "ingest",
            "customers.xlsx",
            "--show-rejections",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.store_path, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(args.log_level_override(), Some("debug"));
        match args.command {
            Some(Commands::Ingest(ingest)) => {
                assert_eq!(ingest.file, PathBuf::from("customers.xlsx"));
                assert!(ingest.show_rejections);
                assert_eq!(ingest.chunk_size, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_locate_accepts_negative_coordinates() {
        let args = Args::try_parse_from(["customer-map", "locate", "-33.9", "-70.6"]).unwrap();
        match args.command {
            Some(Commands::Locate(locate)) => {
                assert_eq!(locate.latitude, -33.9);
                assert_eq!(locate.longitude, -70.6);
                assert_eq!(locate.tolerance, 0.0001);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["customer-map", "-q", "-v", "count"]).is_err());

        let args = Args::try_parse_from(["customer-map", "count", "-q", "--json"]).unwrap();
        assert_eq!(args.log_level_override(), Some("error"));
        assert!(!args.show_progress());
    }

    #[test]
    fn test_list_all_conflicts_with_limit() {
        assert!(Args::try_parse_from(["customer-map", "list", "--all", "-n", "5"]).is_err());
    }
}
