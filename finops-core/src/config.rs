use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::billing::{AwsSessionConfig, DEFAULT_BUDGETS_REGION};
use crate::error::{FinopsError, FinopsResult};
use crate::export::ExportSettings;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FinopsConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Named profiles to report on. Empty means the default credential chain.
    #[serde(default)]
    pub profiles: Vec<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_budgets_region")]
    pub budgets_region: String,

    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportConfig {
    /// Rolling window in days; unset reports the current calendar month.
    #[serde(default)]
    pub time_range: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,

    #[serde(default = "default_json_indent")]
    pub json_indent: usize,

    #[serde(default)]
    pub include_bom: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub color: bool,

    /// Currency code shown instead of the one the billing data reports.
    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default = "default_cost_precision")]
    pub cost_precision: usize,
}

fn default_budgets_region() -> String {
    DEFAULT_BUDGETS_REGION.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_filename() -> String {
    "finops_report".to_string()
}

fn default_csv_delimiter() -> char {
    ','
}

fn default_json_indent() -> usize {
    4
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

fn default_cost_precision() -> usize {
    2
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            region: None,
            budgets_region: default_budgets_region(),
            endpoint_url: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            filename: default_filename(),
            csv_delimiter: default_csv_delimiter(),
            json_indent: default_json_indent(),
            include_bom: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            currency: None,
            cost_precision: default_cost_precision(),
        }
    }
}

impl FinopsConfig {
    pub fn load() -> FinopsResult<Self> {
        Self::load_from_paths(config_file_paths())
    }

    /// Layer the existing files in order, then `FINOPS_*` variables
    /// (`FINOPS_AWS__REGION`, `FINOPS_REPORT__TIME_RANGE`, ...).
    pub fn load_from_paths(paths: Vec<PathBuf>) -> FinopsResult<Self> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FINOPS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("aws.profiles")
                .try_parsing(true),
        );

        let mut finops_config: FinopsConfig = builder.build()?.try_deserialize()?;

        if let Ok(level) = std::env::var("FINOPS_LOG_LEVEL") {
            finops_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            finops_config.logging.level = level;
        }

        if let Ok(profile) = std::env::var("FINOPS_PROFILE") {
            if finops_config.aws.profiles.is_empty() && !profile.is_empty() {
                finops_config.aws.profiles.push(profile);
            }
        }

        finops_config.validate()?;

        Ok(finops_config)
    }

    pub fn validate(&self) -> FinopsResult<()> {
        if self.report.time_range == Some(0) {
            return Err(FinopsError::InvalidConfigValue {
                key: "report.time_range".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.export.filename.trim().is_empty() {
            return Err(FinopsError::InvalidConfigValue {
                key: "export.filename".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        if self.export.json_indent > 8 {
            return Err(FinopsError::InvalidConfigValue {
                key: "export.json_indent".to_string(),
                message: "Must be between 0 and 8".to_string(),
            });
        }

        if self.aws.budgets_region.trim().is_empty() {
            return Err(FinopsError::InvalidConfigValue {
                key: "aws.budgets_region".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        if let Some(currency) = &self.display.currency {
            if currency.trim().is_empty() {
                return Err(FinopsError::InvalidConfigValue {
                    key: "display.currency".to_string(),
                    message: "Must not be empty when set".to_string(),
                });
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(FinopsError::InvalidConfigValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    /// Session settings for one profile (`None` for the default chain).
    pub fn session_config(&self, profile: Option<&str>) -> AwsSessionConfig {
        AwsSessionConfig {
            profile: profile.map(str::to_string),
            region: self.aws.region.clone(),
            budgets_region: self.aws.budgets_region.clone(),
            endpoint_url: self.aws.endpoint_url.clone(),
        }
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            csv_delimiter: self.export.csv_delimiter,
            include_bom: self.export.include_bom,
            json_indent: self.export.json_indent,
        }
    }

    /// Currency to display for a report whose billing data used `reported`.
    pub fn display_currency<'a>(&'a self, reported: &'a str) -> &'a str {
        self.display.currency.as_deref().unwrap_or(reported)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

/// Candidate config files, lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("finops.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("finops").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".finops").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    for path in dotenv_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".finops").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("finops"))
}
