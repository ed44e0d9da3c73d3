//! Report exporters
//!
//! Serializes one or more per-profile cost summaries to CSV or JSON and
//! writes them as timestamped files.

mod csv;
mod json;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FinopsError, FinopsResult};
use crate::models::CostSummary;

pub use self::csv::{CsvExporter, CsvExporterConfig, LineEnding, CSV_HEADERS};
pub use self::json::{JsonExporter, JsonExporterConfig};

/// A cost summary tagged with the profile it was collected from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub profile: Option<String>,
    #[serde(flatten)]
    pub summary: CostSummary,
}

impl ProfileReport {
    pub fn new(profile: Option<String>, summary: CostSummary) -> Self {
        Self { profile, summary }
    }

    /// Profile name for display, `default` for the default credential chain.
    pub fn profile_label(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn exporter(&self, config: &ExportSettings) -> Box<dyn ReportExporter> {
        match self {
            ExportFormat::Csv => Box::new(CsvExporter::with_config(CsvExporterConfig {
                delimiter: config.csv_delimiter,
                include_bom: config.include_bom,
                ..CsvExporterConfig::default()
            })),
            ExportFormat::Json => Box::new(JsonExporter::with_config(JsonExporterConfig {
                indent_size: config.json_indent,
                ..JsonExporterConfig::default()
            })),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = FinopsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(FinopsError::InvalidConfigValue {
                key: "export.format".to_string(),
                message: format!("unknown export format '{}'", other),
            }),
        }
    }
}

/// Exporter options shared by both formats.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub csv_delimiter: char,
    pub include_bom: bool,
    pub json_indent: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            csv_delimiter: ',',
            include_bom: false,
            json_indent: 4,
        }
    }
}

/// `<filename>_<YYYYmmdd_HHMM>.<extension>` for the current local time.
pub fn timestamped_filename(filename: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        filename,
        Local::now().format("%Y%m%d_%H%M"),
        extension
    )
}

#[async_trait]
pub trait ReportExporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn file_extension(&self) -> &str;

    async fn export(&self, reports: &[ProfileReport]) -> FinopsResult<Vec<u8>>;

    /// Write the reports to a timestamped file in `output_dir` (created when
    /// missing) and return its absolute path.
    async fn export_to_file(
        &self,
        reports: &[ProfileReport],
        output_dir: &Path,
        filename: &str,
    ) -> FinopsResult<PathBuf> {
        let bytes = self.export(reports).await?;

        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(timestamped_filename(filename, self.file_extension()));
        tokio::fs::write(&path, bytes).await?;

        let path = tokio::fs::canonicalize(&path).await?;
        info!(
            format = %self.format(),
            reports = reports.len(),
            "Exported dashboard data to {}",
            path.display()
        );
        Ok(path)
    }
}
