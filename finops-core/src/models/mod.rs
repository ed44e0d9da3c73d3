mod budget;
mod cost;
mod window;

pub use budget::Budget;
pub use cost::{CostSummary, ServiceCost};
pub use window::{validate_time_range, DateWindow, PeriodLabels};
