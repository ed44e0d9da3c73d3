#![allow(clippy::useless_format, clippy::format_in_format_args)]

use clap::{Parser, Subcommand};
use colored::Colorize;
use finops_core::{config_file_paths, CliErrorDisplay, FinopsConfig, FinopsError, LoggingConfig};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{handle_categories_command, handle_costs_command, CategoriesArgs, CostsArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "finops")]
#[command(version = VERSION)]
#[command(about = "FinOps dashboard - AWS cost and budget reporting")]
#[command(long_about = r#"
Reports AWS spend for the current and previous period, cost by service and
budget status for one or more named profiles, and exports the results to CSV
or JSON.

Use 'finops costs' for the dashboard, 'finops categories' for spend grouped by
service category and 'finops config' to inspect the effective configuration.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, help = "Disable colored output")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show the cost dashboard and optionally export it")]
    Costs(CostsArgs),

    #[command(about = "Show current period cost grouped by service category")]
    Categories(CategoriesArgs),

    #[command(about = "Show the effective configuration")]
    Config {
        #[arg(long, help = "List the configuration files that are searched")]
        paths: bool,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = FinopsConfig::load();
    init_logging(cli.verbose, config.as_ref().ok().map(|c| &c.logging));

    let color = !cli.no_color && config.as_ref().map(|c| c.display.color).unwrap_or(true);
    if !color {
        colored::control::set_override(false);
    }

    match run(cli, config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<FinopsError>() {
                Some(finops_error) => {
                    eprint!(
                        "{}: {}",
                        "Error".red().bold(),
                        CliErrorDisplay::new(finops_error)
                    );
                }
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, logging: Option<&LoggingConfig>) {
    let default_level = if verbose {
        "debug"
    } else {
        logging.map(|l| l.level.as_str()).unwrap_or("warn")
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let json = logging.map(|l| l.json_format).unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn run(cli: Cli, config: Result<FinopsConfig, FinopsError>) -> anyhow::Result<()> {
    match cli.command {
        Commands::Costs(args) => handle_costs_command(args, &config?).await,
        Commands::Categories(args) => handle_categories_command(args, &config?).await,
        Commands::Config { paths } => cmd_config(&config?, paths),
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

fn cmd_config(config: &FinopsConfig, paths: bool) -> anyhow::Result<()> {
    if paths {
        println!("{}", "Configuration files (lowest precedence first)".cyan().bold());
        for path in config_file_paths() {
            let marker = if path.exists() {
                "✓".green()
            } else {
                "·".dimmed()
            };
            println!("  {} {}", marker, path.display());
        }
        println!(
            "  {} {}",
            "+".blue(),
            "FINOPS_* environment variables (e.g. FINOPS_AWS__REGION)".dimmed()
        );
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "FinOps Dashboard Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "AWS Services:".bold());
        println!("    Cost Explorer (UnblendedCost)");
        println!("    Budgets (us-east-1 by default, see aws.budgets_region)");
        println!("    STS");
        println!();
        println!("  {}", "Export Formats:".bold());
        println!("    csv, json");
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("finops {}", VERSION);
    }

    Ok(())
}
