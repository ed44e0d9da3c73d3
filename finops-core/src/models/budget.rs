use serde::{Deserialize, Serialize};

/// A spending limit configured on the account, with tracked spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub name: String,
    pub limit: f64,
    pub actual_spend: f64,
    /// Forecasted end-of-period spend; absent until the service has enough
    /// history to forecast.
    pub forecast: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Budget {
    pub fn new(name: impl Into<String>, limit: f64, actual_spend: f64) -> Self {
        Self {
            name: name.into(),
            limit,
            actual_spend,
            forecast: None,
            unit: None,
        }
    }

    pub fn with_forecast(mut self, forecast: f64) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Actual spend as a percentage of the limit.
    pub fn utilization_percent(&self) -> f64 {
        if self.limit > 0.0 {
            (self.actual_spend / self.limit) * 100.0
        } else {
            0.0
        }
    }

    pub fn remaining(&self) -> f64 {
        self.limit - self.actual_spend
    }

    pub fn is_exceeded(&self) -> bool {
        self.actual_spend > self.limit
    }

    pub fn is_forecast_to_exceed(&self) -> bool {
        self.forecast.is_some_and(|f| f > self.limit)
    }
}
