use std::io::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FinopsResult;
use crate::services::categorize_services;

use super::{ExportFormat, ProfileReport, ReportExporter};

pub const CSV_HEADERS: &[&str] = &[
    "profile",
    "account_id",
    "section",
    "label",
    "amount",
    "limit",
    "actual_spend",
    "forecast",
    "period_start",
    "period_end",
];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvExporterConfig {
    pub delimiter: char,
    pub quote_char: char,
    pub include_bom: bool,
    pub line_ending: LineEnding,
}

impl Default for CsvExporterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: '"',
            include_bom: false,
            line_ending: LineEnding::Lf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    Lf,
    Crlf,
}

impl LineEnding {
    fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Flat CSV: one row per total, service, budget and category.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    config: CsvExporterConfig,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CsvExporterConfig) -> Self {
        Self { config }
    }

    fn escape_field(&self, field: &str) -> String {
        let needs_quoting = field.contains(self.config.delimiter)
            || field.contains(self.config.quote_char)
            || field.contains('\n')
            || field.contains('\r');

        if needs_quoting {
            let quote = self.config.quote_char.to_string();
            let escaped = field.replace(&quote, &quote.repeat(2));
            format!("{}{}{}", quote, escaped, quote)
        } else {
            field.to_string()
        }
    }

    fn write_row(&self, writer: &mut Vec<u8>, fields: &[String]) -> FinopsResult<()> {
        let line = fields
            .iter()
            .map(|f| self.escape_field(f))
            .collect::<Vec<_>>()
            .join(&self.config.delimiter.to_string());
        write!(writer, "{}{}", line, self.config.line_ending.as_str())?;
        Ok(())
    }

    fn report_rows(report: &ProfileReport) -> Vec<Vec<String>> {
        let summary = &report.summary;
        let window = &summary.window;
        let profile = report.profile_label().to_string();
        let current_start = window.start.to_string();
        let current_end = window.end.to_string();
        let previous_start = window.previous_start.to_string();
        let previous_end = window.previous_end.to_string();

        let row = |section: &str,
                   label: &str,
                   amount: String,
                   budget: [String; 3],
                   period: (&str, &str)| {
            let [limit, actual, forecast] = budget;
            vec![
                profile.clone(),
                summary.account_id.clone(),
                section.to_string(),
                label.to_string(),
                amount,
                limit,
                actual,
                forecast,
                period.0.to_string(),
                period.1.to_string(),
            ]
        };
        let no_budget = || [String::new(), String::new(), String::new()];
        let current = (current_start.as_str(), current_end.as_str());

        let mut rows = vec![
            row(
                "current_period_total",
                &summary.period_labels.current,
                summary.current_period_total.to_string(),
                no_budget(),
                current,
            ),
            row(
                "previous_period_total",
                &summary.period_labels.previous,
                summary.previous_period_total.to_string(),
                no_budget(),
                (previous_start.as_str(), previous_end.as_str()),
            ),
        ];

        for service in &summary.current_period_cost_by_service {
            rows.push(row(
                "service",
                &service.service_name,
                service.amount.to_string(),
                no_budget(),
                current,
            ));
        }

        for budget in &summary.budgets {
            rows.push(row(
                "budget",
                &budget.name,
                String::new(),
                [
                    budget.limit.to_string(),
                    budget.actual_spend.to_string(),
                    budget.forecast.map(|f| f.to_string()).unwrap_or_default(),
                ],
                ("", ""),
            ));
        }

        for category in categorize_services(&summary.current_period_cost_by_service) {
            rows.push(row(
                "category",
                category.category.as_str(),
                category.amount.to_string(),
                no_budget(),
                current,
            ));
        }

        rows
    }
}

#[async_trait]
impl ReportExporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn file_extension(&self) -> &str {
        "csv"
    }

    async fn export(&self, reports: &[ProfileReport]) -> FinopsResult<Vec<u8>> {
        let mut output = Vec::new();

        if self.config.include_bom {
            output.extend_from_slice(UTF8_BOM);
        }

        let headers: Vec<String> = CSV_HEADERS.iter().map(|h| h.to_string()).collect();
        self.write_row(&mut output, &headers)?;

        for report in reports {
            for row in Self::report_rows(report) {
                self.write_row(&mut output, &row)?;
            }
        }

        Ok(output)
    }
}
