use std::future::Future;
use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use finops_core::{
    get_cost_data, AwsSession, Budget, CostSummary, DateWindow, ExportFormat, FinopsConfig,
    FinopsError, FinopsResult, PeriodLabels, ProfileReport, ServiceCost,
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Profile and window selection shared by the reporting commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[arg(
        short,
        long = "profile",
        help = "AWS profile to report on (repeatable, defaults to aws.profiles or the default chain)"
    )]
    pub profiles: Vec<String>,

    #[arg(
        short,
        long,
        help = "Rolling window in days (defaults to the current calendar month)"
    )]
    pub time_range: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct CostsArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(short, long, default_value = "text", value_enum, help = "Output format")]
    pub format: OutputFormat,

    #[arg(short, long, help = "Export format to write (csv, json; repeatable)")]
    pub export: Vec<ExportFormat>,

    #[arg(short, long, help = "Directory for exported files")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Base name for exported files")]
    pub filename: Option<String>,
}

/// A profile whose session or cost queries failed.
#[derive(Debug)]
pub struct ProfileFailure {
    pub profile: Option<String>,
    pub error: FinopsError,
}

impl ProfileFailure {
    pub fn profile_label(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }
}

/// Reports for every profile that succeeded, plus the ones that did not.
#[derive(Debug)]
pub struct CollectedReports {
    pub window: DateWindow,
    pub labels: PeriodLabels,
    pub reports: Vec<ProfileReport>,
    pub failures: Vec<ProfileFailure>,
}

impl CollectedReports {
    /// The run's outcome once everything that succeeded has been shown.
    pub fn finish(self) -> anyhow::Result<()> {
        let total = self.reports.len() + self.failures.len();
        let mut failures = self.failures;

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0).error.into()),
            n => {
                let details: Vec<String> = failures
                    .iter()
                    .map(|f| format!("  {}: {}", f.profile_label(), f.error))
                    .collect();
                anyhow::bail!("{} of {} profiles failed:\n{}", n, total, details.join("\n"))
            }
        }
    }
}

pub async fn handle_costs_command(args: CostsArgs, config: &FinopsConfig) -> anyhow::Result<()> {
    let collected = collect_reports(&args.report, config).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&collected.reports)?),
        OutputFormat::Text => print_dashboard(&collected, config),
    }

    let mut formats: Vec<ExportFormat> = Vec::new();
    for format in &args.export {
        if !formats.contains(format) {
            formats.push(*format);
        }
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.export.output_dir.clone());
    let filename = args
        .filename
        .clone()
        .unwrap_or_else(|| config.export.filename.clone());

    if filename.trim().is_empty() {
        anyhow::bail!("Export filename must not be empty");
    }

    if !formats.is_empty() && collected.reports.is_empty() {
        eprintln!("{}", "No profile reports to export.".yellow());
        formats.clear();
    }

    for format in formats {
        let exporter = format.exporter(&config.export_settings());
        let path = exporter
            .export_to_file(&collected.reports, &output_dir, &filename)
            .await?;
        println!(
            "{} Exported {} report to {}",
            "✓".green().bold(),
            format.to_string().to_uppercase(),
            path.display()
        );
    }

    collected.finish()
}

/// Run the aggregator once per selected profile, in order.
///
/// An invalid window fails the whole run. A profile that fails is recorded
/// and the remaining profiles still run.
pub async fn collect_reports(
    args: &ReportArgs,
    config: &FinopsConfig,
) -> anyhow::Result<CollectedReports> {
    let time_range = args.time_range.or(config.report.time_range);
    let window = DateWindow::compute(Local::now().date_naive(), time_range)?;

    let (reports, failures) =
        collect_profiles(selected_profiles(args, config), move |profile| async move {
            let session = AwsSession::connect(config.session_config(profile.as_deref())).await?;
            get_cost_data(&session, time_range).await
        })
        .await;

    Ok(CollectedReports {
        window,
        labels: PeriodLabels::for_range(time_range),
        reports,
        failures,
    })
}

pub async fn collect_profiles<F, Fut>(
    profiles: Vec<Option<String>>,
    mut fetch: F,
) -> (Vec<ProfileReport>, Vec<ProfileFailure>)
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = FinopsResult<CostSummary>>,
{
    let mut reports = Vec::new();
    let mut failures = Vec::new();

    for profile in profiles {
        let label = profile.as_deref().unwrap_or("default").to_string();
        info!(profile = %label, "Collecting cost data");

        match fetch(profile.clone()).await {
            Ok(summary) => reports.push(ProfileReport::new(profile, summary)),
            Err(error) => {
                warn!(
                    profile = %label,
                    error_code = error.error_code(),
                    "Profile report failed: {}",
                    error
                );
                failures.push(ProfileFailure { profile, error });
            }
        }
    }

    (reports, failures)
}

/// Profiles from the command line, then from config, then the default chain.
pub fn selected_profiles(args: &ReportArgs, config: &FinopsConfig) -> Vec<Option<String>> {
    let names = if !args.profiles.is_empty() {
        &args.profiles
    } else {
        &config.aws.profiles
    };

    let mut profiles: Vec<Option<String>> = Vec::new();
    for name in names {
        let name = Some(name.clone());
        if !profiles.contains(&name) {
            profiles.push(name);
        }
    }

    if profiles.is_empty() {
        profiles.push(None);
    }
    profiles
}

fn print_dashboard(collected: &CollectedReports, config: &FinopsConfig) {
    let precision = config.display.cost_precision;
    let labels = &collected.labels;
    let window = &collected.window;

    println!("{}", "AWS FinOps Dashboard".cyan().bold());
    println!(
        "{}",
        format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M")).dimmed()
    );
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Profile").fg(Color::White),
            Cell::new("Account ID").fg(Color::White),
            Cell::new(format!(
                "{}\n({} to {})",
                labels.previous, window.previous_start, window.previous_end
            ))
            .fg(Color::White),
            Cell::new(format!(
                "{}\n({} to {})",
                labels.current, window.start, window.end
            ))
            .fg(Color::White),
            Cell::new("Cost By Service").fg(Color::White),
            Cell::new("Budget Status").fg(Color::White),
        ]);

    for report in &collected.reports {
        let summary = &report.summary;
        let currency = config.display_currency(&summary.currency);
        let budget_lines = format_budget_info(&summary.budgets, currency);

        table.add_row(vec![
            Cell::new(report.profile_label()).fg(Color::Magenta),
            Cell::new(&summary.account_id),
            Cell::new(format_amount(summary.previous_period_total, precision, currency)),
            current_total_cell(summary, precision, currency),
            Cell::new(
                format_service_costs(&summary.current_period_cost_by_service, currency).join("\n"),
            )
            .fg(Color::Green),
            budget_cell(&summary.budgets, budget_lines),
        ]);
    }

    for failure in &collected.failures {
        table.add_row(vec![
            Cell::new(failure.profile_label()).fg(Color::Magenta),
            Cell::new("-").fg(Color::DarkGrey),
            Cell::new("-").fg(Color::DarkGrey),
            Cell::new("-").fg(Color::DarkGrey),
            Cell::new(failure.error.to_string()).fg(Color::Red),
            Cell::new("-").fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
}

fn current_total_cell(summary: &CostSummary, precision: usize, currency: &str) -> Cell {
    let amount = format_amount(summary.current_period_total, precision, currency);

    match summary.period_change_percent() {
        Some(change) if change > 0.0 => {
            Cell::new(format!("{}\n↑ {:.2}%", amount, change)).fg(Color::Red)
        }
        Some(change) if change < 0.0 => {
            Cell::new(format!("{}\n↓ {:.2}%", amount, change.abs())).fg(Color::Green)
        }
        Some(_) => Cell::new(format!("{}\n→ 0.00%", amount)).fg(Color::Yellow),
        None => Cell::new(amount),
    }
}

fn budget_cell(budgets: &[Budget], lines: Vec<String>) -> Cell {
    if lines.is_empty() {
        return Cell::new("No budgets found").fg(Color::DarkGrey);
    }

    let color = if budgets.iter().any(Budget::is_exceeded) {
        Color::Red
    } else if budgets.iter().any(Budget::is_forecast_to_exceed) {
        Color::Yellow
    } else {
        Color::Green
    };
    Cell::new(lines.join("\n")).fg(color)
}

/// Prefix for amounts in `currency`, falling back to the code itself.
pub fn currency_symbol(currency: &str) -> String {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" | "CNY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        _ => format!("{} ", currency),
    }
}

pub fn format_amount(amount: f64, precision: usize, currency: &str) -> String {
    format!("{}{:.*}", currency_symbol(currency), precision, amount)
}

/// One `"<service>: <symbol><amount>"` line per service, or a placeholder when empty.
pub fn format_service_costs(services: &[ServiceCost], currency: &str) -> Vec<String> {
    if services.is_empty() {
        return vec!["No costs associated with this account".to_string()];
    }

    let symbol = currency_symbol(currency);
    services
        .iter()
        .map(|s| format!("{}: {}{:.2}", s.service_name, symbol, s.amount))
        .collect()
}

/// Limit and actual spend lines for each budget.
pub fn format_budget_info(budgets: &[Budget], currency: &str) -> Vec<String> {
    let symbol = currency_symbol(currency);
    let mut lines = Vec::with_capacity(budgets.len() * 2);
    for budget in budgets {
        lines.push(format!("{} limit: {}{}", budget.name, symbol, budget.limit));
        lines.push(format!(
            "{} actual: {}{:.2}",
            budget.name, symbol, budget.actual_spend
        ));
    }
    lines
}
