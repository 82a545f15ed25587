//! mysql-migrate CLI - dependency-ordered MySQL to MySQL migration.

mod logging;

use clap::{Parser, Subcommand};
use mysql_migrate::error::{EXIT_CONNECTION_ERROR, EXIT_VALIDATION_MISMATCH};
use mysql_migrate::{Config, MigrateError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mysql-migrate")]
#[command(about = "Dependency-ordered MySQL to MySQL schema and data migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Override the log file from the configuration
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Skip a table (repeatable); added to the configured skip list
    #[arg(long = "skip-table", value_name = "TABLE")]
    skip_tables: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full migration
    Run {
        /// Override rows per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Dry run: inspect and show the migration order without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate row counts between source and destination
    Validate,

    /// Test database connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Load configuration and set up logging, then execute the command.
///
/// Errors before logging is up are returned to `main`; after that they are
/// logged as fatal and turned into an exit code here.
async fn run(cli: Cli) -> Result<ExitCode, MigrateError> {
    let mut config = Config::load(&cli.config)?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let console = if cli.output_json {
        logging::Console::Stderr
    } else {
        logging::Console::Stdout
    };
    let log_file = PathBuf::from(&config.migration.log_file);
    logging::init(&cli.verbosity, &log_file, console)?;
    info!("Loaded configuration from {:?}", cli.config);

    match execute(&cli, config).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!("Fatal: {}", e.format_detailed().trim_end());
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(ref path) = cli.log_file {
        config.migration.log_file = path.to_string_lossy().into_owned();
    }
    for table in &cli.skip_tables {
        if !config.migration.skip_tables.contains(table) {
            config.migration.skip_tables.push(table.clone());
        }
    }
    if let Commands::Run {
        batch_size: Some(size),
        ..
    } = cli.command
    {
        config.migration.batch_size = size;
    }
}

async fn execute(cli: &Cli, config: Config) -> Result<ExitCode, MigrateError> {
    match cli.command {
        Commands::Run { dry_run: true, .. } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let plan = orchestrator.plan().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("\nDry run completed!");
                println!("  Tables: {}", plan.tables.len());
                for (i, table) in plan.tables.iter().enumerate() {
                    if table.depends_on.is_empty() {
                        println!("  {:>3}. {} ({} rows)", i + 1, table.name, table.rows);
                    } else {
                        println!(
                            "  {:>3}. {} ({} rows) after {}",
                            i + 1,
                            table.name,
                            table.rows,
                            table.depends_on.join(", ")
                        );
                    }
                }
            }
        }

        Commands::Run { dry_run: false, .. } => {
            let orchestrator = Orchestrator::connect(config).await?;
            let result = orchestrator.run().await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nMigration completed!");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Tables: {}/{}",
                    result.tables_success, result.tables_total
                );
                println!("  Rows: {}", result.rows_migrated);
                println!("  Throughput: {} rows/sec", result.rows_per_second);
            }
        }

        Commands::Validate => {
            let orchestrator = Orchestrator::connect(config).await?;
            let report = orchestrator.validate().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nValidation Results:");
                for table in &report.tables {
                    let destination = table
                        .destination_rows
                        .map_or_else(|| "missing".to_string(), |n| n.to_string());
                    println!(
                        "  {}: source={} destination={} {}",
                        table.table,
                        table.source_rows,
                        destination,
                        if table.matches { "OK" } else { "MISMATCH" }
                    );
                }
            }

            if !report.all_match() {
                error!(
                    "{} of {} tables have mismatched row counts",
                    report.mismatched().len(),
                    report.tables.len()
                );
                return Ok(ExitCode::from(EXIT_VALIDATION_MISMATCH));
            }
        }

        Commands::HealthCheck => {
            let result = Orchestrator::health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                print_probe(
                    "Source",
                    &config.source.display_target(),
                    result.source_connected,
                    result.source_latency_ms,
                    result.source_error.as_deref(),
                );
                print_probe(
                    "Destination",
                    &config.destination.display_target(),
                    result.destination_connected,
                    result.destination_latency_ms,
                    result.destination_error.as_deref(),
                );
                let overall = if result.healthy {
                    "HEALTHY"
                } else {
                    "UNHEALTHY"
                };
                println!("\n  Overall: {}", overall);
            }

            if !result.healthy {
                return Ok(ExitCode::from(EXIT_CONNECTION_ERROR));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_probe(label: &str, target: &str, connected: bool, latency_ms: u64, err: Option<&str>) {
    println!(
        "  {} ({}): {} ({}ms)",
        label,
        target,
        if connected { "OK" } else { "FAILED" },
        latency_ms
    );
    if let Some(err) = err {
        println!("    Error: {}", err);
    }
}
