use clap::Parser;
use customer_map::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    let Some(command) = args.command.clone() else {
        show_help_and_commands();
        process::exit(0);
    };

    // Create async runtime and run the command with Ctrl+C handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available; never resolve
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args, command) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Interrupted by user"))
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Customer Map - Utility Customer Ingestion and Search");
    println!("====================================================");
    println!();
    println!("Validate a customer spreadsheet with coordinates and keep the valid");
    println!("customers in a persistent store indexed by account number and name.");
    println!();
    println!("USAGE:");
    println!("    customer-map <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    ingest      Ingest a .csv or spreadsheet file, replacing stored customers");
    println!("    list        List stored customers in account-number order");
    println!("    search      Search by account-number or name prefix");
    println!("    show        Show every field of one customer");
    println!("    count       Print the number of stored and excluded customers");
    println!("    locate      Find the customer at a coordinate");
    println!("    clear       Remove every stored customer");
    println!();
    println!("OPTIONS:");
    println!("    --store <FILE>   Store snapshot path");
    println!("    -c, --config     Configuration file (TOML)");
    println!("    --json           Print query results as JSON");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    customer-map ingest customers.xlsx --show-rejections");
    println!("    customer-map search ab");
    println!("    customer-map show AB100 --json");
    println!();
    println!("For detailed help on any command, use:");
    println!("    customer-map <COMMAND> --help");
}
