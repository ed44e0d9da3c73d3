use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use finops_core::{categorize_services, CategoryCost, FinopsConfig, ProfileReport};
use serde::Serialize;

use super::costs::{collect_reports, format_amount, OutputFormat, ReportArgs};

#[derive(Args, Debug, Clone)]
pub struct CategoriesArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    #[arg(short, long, default_value = "text", value_enum, help = "Output format")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ProfileCategories {
    profile: Option<String>,
    account_id: String,
    total: f64,
    categories: Vec<CategoryCost>,
}

pub async fn handle_categories_command(
    args: CategoriesArgs,
    config: &FinopsConfig,
) -> anyhow::Result<()> {
    let collected = collect_reports(&args.report, config).await?;
    let grouped: Vec<ProfileCategories> =
        collected.reports.iter().map(group_report).collect();

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&grouped)?);
        return collected.finish();
    }

    let precision = config.display.cost_precision;

    for (report, profile) in collected.reports.iter().zip(&grouped) {
        let currency = config.display_currency(&report.summary.currency);
        println!(
            "{} {} {}",
            "Cost by category for".cyan().bold(),
            report.profile_label().magenta().bold(),
            format!("({})", profile.account_id).dimmed()
        );
        println!(
            "{}",
            format!(
                "{} ({} to {})",
                report.summary.period_labels.current,
                report.summary.window.start,
                report.summary.window.end
            )
            .dimmed()
        );
        println!();

        if profile.categories.is_empty() {
            println!("{}", "No costs associated with this account".yellow());
            println!();
            continue;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Category").fg(Color::White),
                Cell::new("Services").fg(Color::White),
                Cell::new("Cost").fg(Color::White),
                Cell::new("Share").fg(Color::White),
            ]);

        for category in &profile.categories {
            table.add_row(vec![
                Cell::new(category.category.as_str()),
                Cell::new(category.service_count.to_string()),
                Cell::new(format_amount(category.amount, precision, currency)).fg(Color::Yellow),
                Cell::new(format!("{:.1}%", share(category.amount, profile.total))),
            ]);
        }

        println!("{table}");
        println!(
            "  {} {}",
            "Total:".bold(),
            format_amount(profile.total, precision, currency).yellow()
        );
        println!();
    }

    for failure in &collected.failures {
        println!(
            "{} {}: {}",
            "✗".red().bold(),
            failure.profile_label().magenta().bold(),
            failure.error.to_string().red()
        );
    }

    collected.finish()
}

fn group_report(report: &ProfileReport) -> ProfileCategories {
    let categories = categorize_services(&report.summary.current_period_cost_by_service);
    ProfileCategories {
        profile: report.profile.clone(),
        account_id: report.summary.account_id.clone(),
        total: categories.iter().map(|c| c.amount).sum(),
        categories,
    }
}

fn share(amount: f64, total: f64) -> f64 {
    if total > 0.0 {
        amount / total * 100.0
    } else {
        0.0
    }
}
