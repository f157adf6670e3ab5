//! Command implementations for the customer map CLI
//!
//! Sets up logging and configuration, builds the [`AppContext`], and
//! dispatches each subcommand. Human output is colored; `--json` prints
//! query results as JSON on stdout.

use crate::cli::args::{
    Args, ClearArgs, Commands, IngestArgs, ListArgs, LocateArgs, SearchArgs, ShowArgs,
};
use crate::config::Config;
use crate::context::AppContext;
use crate::models::Customer;
use crate::processor::{IngestReport, ProgressBarSink};
use anyhow::{Context, Result};
use colored::*;
use std::io::{self, Write};
use tracing::{debug, info};

/// Rejections printed before the list is truncated
const MAX_REJECTIONS_SHOWN: usize = 100;

/// Main command runner
pub async fn run(args: Args, command: Commands) -> Result<()> {
    let config = load_configuration(&args)?;
    setup_logging(&args, &config.logging.level)?;
    debug!("Command line arguments: {:?}", args);
    debug!("Loaded configuration: {:?}", config);

    let focus_enabled = !args.json && !args.quiet;
    let mut ctx = AppContext::new(config).context("Failed to initialize customer store")?;
    if focus_enabled {
        ctx = ctx.with_focus_sink(|customer: &Customer| {
            println!(
                "{} {} - {}",
                "Focus:".bright_magenta().bold(),
                customer.accno.bright_cyan(),
                customer.name
            );
        });
    }
    info!("Using store {}", ctx.store().path().display());

    match command {
        Commands::Ingest(ingest_args) => run_ingest(&mut ctx, &args, ingest_args).await,
        Commands::List(list_args) => run_list(&ctx, &args, list_args).await,
        Commands::Search(search_args) => run_search(&ctx, &args, search_args).await,
        Commands::Show(show_args) => run_show(&ctx, &args, show_args).await,
        Commands::Count => run_count(&ctx, &args).await,
        Commands::Locate(locate_args) => run_locate(&ctx, &args, locate_args).await,
        Commands::Clear(clear_args) => run_clear(&mut ctx, &args, clear_args).await,
    }
}

/// Set up structured logging at the requested level
fn setup_logging(args: &Args, configured_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level_override().unwrap_or(configured_level);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("customer_map={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using layered approach (file -> env -> args)
fn load_configuration(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config_file {
        if !path.exists() {
            anyhow::bail!("Config file does not exist: {}", path.display());
        }
    }

    let mut config = Config::load_layered(args.config_file.as_deref())
        .context("Failed to load configuration")?;

    if let Some(path) = &args.store_path {
        config = config.with_store_path(path);
    }
    if let Some(Commands::Ingest(IngestArgs {
        chunk_size: Some(chunk_size),
        ..
    })) = &args.command
    {
        config = config.with_chunk_size(*chunk_size);
    }
    if let Some(level) = args.log_level_override() {
        config = config.with_log_level(level);
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_ingest(ctx: &mut AppContext, args: &Args, ingest_args: IngestArgs) -> Result<()> {
    let path = ingest_args.file;
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let progress = if args.show_progress() {
        ProgressBarSink::new(format!("Validating {}", file_name))
    } else {
        ProgressBarSink::hidden()
    };

    let report = match ctx.ingest_path(&path, &progress).await {
        Ok(report) => {
            progress.finish("Validation complete");
            report
        }
        Err(e) => {
            progress.abandon();
            return Err(e).with_context(|| format!("Failed to ingest {}", path.display()));
        }
    };

    if !args.quiet {
        print_ingest_report(&report, ingest_args.show_rejections);
    }
    Ok(())
}

fn print_ingest_report(report: &IngestReport, show_rejections: bool) {
    let stats = &report.stats;
    println!();
    println!("{}", "Ingestion complete".bright_green().bold());
    println!("  {} {}", "Source:".bright_white(), stats.source.bright_cyan());
    println!("  {} {}", "Rows read:".bright_white(), stats.rows_parsed);
    println!(
        "  {} {} ({:.1}%)",
        "Customers stored:".bright_white(),
        stats.stored.to_string().bright_green(),
        stats.success_rate()
    );
    if stats.rejected > 0 {
        println!(
            "  {} {}",
            "Rejected rows:".bright_white(),
            stats.rejected.to_string().bright_yellow()
        );
    }
    if stats.excluded() > 0 {
        println!(
            "  {} {} records excluded (missing or invalid fields)",
            "Excluded:".bright_white(),
            stats.excluded().to_string().bright_yellow()
        );
    }
    if stats.malformed_lines > 0 {
        println!(
            "  {} {}",
            "Malformed lines skipped:".bright_white(),
            stats.malformed_lines.to_string().bright_yellow()
        );
    }
    println!(
        "  {} {:.2}s",
        "Elapsed:".bright_white(),
        stats.elapsed.as_secs_f64()
    );

    if show_rejections && !report.rejections.is_empty() {
        println!();
        println!("{}", "Rejected rows:".bright_yellow().bold());
        for rejection in report.rejections.iter().take(MAX_REJECTIONS_SHOWN) {
            println!("  {}", rejection);
        }
        if report.rejections.len() > MAX_REJECTIONS_SHOWN {
            println!(
                "  {}",
                format!(
                    "... and {} more",
                    report.rejections.len() - MAX_REJECTIONS_SHOWN
                )
                .bright_black()
            );
        }
    }
}

async fn run_list(ctx: &AppContext, args: &Args, list_args: ListArgs) -> Result<()> {
    let query = ctx.query();

    if list_args.all {
        let mut customers = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = query.next_page(cursor.as_deref()).await?;
            debug!("Fetched render batch of {} customers", page.customers.len());
            customers.extend(page.customers);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        return print_customers(&customers, args);
    }

    let customers = match list_args.limit {
        Some(limit) => ctx.store().get_slice(limit).await?,
        None => query.initial_page().await?,
    };
    print_customers(&customers, args)?;

    if !args.json && !args.quiet {
        let total = query.count().await?;
        if total > customers.len() {
            println!(
                "{}",
                format!("Showing {} of {} customers", customers.len(), total).bright_black()
            );
        }
    }
    Ok(())
}

async fn run_search(ctx: &AppContext, args: &Args, search_args: SearchArgs) -> Result<()> {
    let results = ctx.query().search_page(&search_args.term).await?;
    print_customers(&results, args)?;
    ctx.query().wait_for_focus().await;
    Ok(())
}

async fn run_show(ctx: &AppContext, args: &Args, show_args: ShowArgs) -> Result<()> {
    let customer = ctx
        .query()
        .get(&show_args.accno)
        .await?
        .with_context(|| format!("No customer with account number '{}'", show_args.accno))?;
    print_customer_detail(&customer, args)
}

async fn run_count(ctx: &AppContext, args: &Args) -> Result<()> {
    let count = ctx.query().count().await?;
    let excluded = ctx.query().excluded_count().await?;

    if args.json {
        let value = serde_json::json!({ "count": count, "excluded": excluded });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} {}", "Customers:".bright_white(), count.to_string().bright_green());
        if excluded > 0 {
            println!(
                "{} {} records excluded (missing or invalid fields)",
                "Excluded:".bright_white(),
                excluded.to_string().bright_yellow()
            );
        }
    }
    Ok(())
}

async fn run_locate(ctx: &AppContext, args: &Args, locate_args: LocateArgs) -> Result<()> {
    let found = ctx
        .query()
        .locate(
            locate_args.latitude,
            locate_args.longitude,
            Some(locate_args.tolerance),
        )
        .await?;

    match found {
        Some(customer) => print_customer_detail(&customer, args),
        None if args.json => {
            println!("null");
            Ok(())
        }
        None => {
            println!(
                "{}",
                format!(
                    "No customer within {} of {}, {}",
                    locate_args.tolerance, locate_args.latitude, locate_args.longitude
                )
                .bright_yellow()
            );
            Ok(())
        }
    }
}

async fn run_clear(ctx: &mut AppContext, args: &Args, clear_args: ClearArgs) -> Result<()> {
    if !clear_args.yes && !confirm("Delete all stored customers?")? {
        println!("{}", "Aborted".bright_yellow());
        return Ok(());
    }

    ctx.clear().await.context("Failed to clear customer store")?;
    if !args.quiet {
        println!("{}", "Customer store cleared".bright_green().bold());
    }
    Ok(())
}

/// Ask a yes/no question on stdin; anything but "y" or "yes" is a no
fn confirm(question: &str) -> Result<bool> {
    print!("{} {} ", question.bright_white(), "[y/N]".bright_black());
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    Ok(matches!(
        input.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn print_customers(customers: &[Customer], args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(customers)?);
        return Ok(());
    }

    if customers.is_empty() {
        println!("{}", "No customers found".bright_yellow());
        return Ok(());
    }

    for customer in customers {
        println!(
            "  {} {} {}",
            customer.accno.bright_cyan(),
            customer.name,
            format!("({:.6}, {:.6})", customer.latitude, customer.longitude).bright_black()
        );
    }
    Ok(())
}

fn print_customer_detail(customer: &Customer, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(customer)?);
        return Ok(());
    }

    println!("{}", customer.name.bright_green().bold());
    for (label, value) in customer.detail_lines() {
        let value = if value.is_empty() { "-".to_string() } else { value };
        println!("  {:<14} {}", format!("{}:", label).bright_white(), value);
    }
    Ok(())
}
