#![allow(
    clippy::needless_borrows_for_generic_args,
    clippy::manual_range_contains,
    clippy::derivable_impls,
    clippy::type_complexity,
    clippy::len_zero
)]

pub mod billing;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod services;

pub use billing::{
    AwsSession, AwsSessionConfig, CostQuery, CostSession, Granularity, GroupAmount,
    GroupDimension, QueryKind, TimeBucket, DEFAULT_BUDGETS_REGION, DEFAULT_CURRENCY,
    UNBLENDED_COST,
};
pub use config::{
    config_file_paths, get_config_dir, AwsConfig, DisplayConfig, ExportConfig, FinopsConfig,
    LoggingConfig, ReportConfig,
};
pub use error::{CliErrorDisplay, FinopsError, FinopsResult};
pub use export::{
    timestamped_filename, CsvExporter, CsvExporterConfig, ExportFormat, ExportSettings,
    JsonExporter, JsonExporterConfig, LineEnding, ProfileReport, ReportExporter, CSV_HEADERS,
};
pub use models::{
    validate_time_range, Budget, CostSummary, DateWindow, PeriodLabels, ServiceCost,
};
pub use services::{
    aggregate_service_costs, categorize_service, categorize_services, get_cost_data,
    get_cost_data_on, process_service_costs, CategoryCost, CostAggregator, ServiceCategory,
    MIN_SERVICE_COST,
};
