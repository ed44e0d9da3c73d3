use serde::{Deserialize, Serialize};

use super::budget::Budget;
use super::window::{DateWindow, PeriodLabels};

/// Summed unblended cost of one AWS service over the current period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service_name: String,
    pub amount: f64,
}

impl ServiceCost {
    pub fn new(service_name: impl Into<String>, amount: f64) -> Self {
        Self {
            service_name: service_name.into(),
            amount,
        }
    }
}

/// Everything a dashboard row needs for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub account_id: String,
    pub current_period_total: f64,
    pub previous_period_total: f64,
    /// Sorted by amount, highest first.
    pub current_period_cost_by_service: Vec<ServiceCost>,
    pub budgets: Vec<Budget>,
    pub period_labels: PeriodLabels,
    pub time_range: Option<u32>,
    pub window: DateWindow,
    pub currency: String,
}

impl CostSummary {
    /// Relative change from the previous period, `None` when there was no
    /// previous spend to compare against.
    pub fn period_change_percent(&self) -> Option<f64> {
        if self.previous_period_total > 0.0 {
            Some(
                (self.current_period_total - self.previous_period_total)
                    / self.previous_period_total
                    * 100.0,
            )
        } else {
            None
        }
    }

    pub fn service_total(&self) -> f64 {
        self.current_period_cost_by_service
            .iter()
            .map(|s| s.amount)
            .sum()
    }

    pub fn top_service(&self) -> Option<&ServiceCost> {
        self.current_period_cost_by_service.first()
    }

    pub fn has_costs(&self) -> bool {
        !self.current_period_cost_by_service.is_empty()
    }
}
