use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{FinopsError, FinopsResult};

/// Current and previous reporting periods. All dates are inclusive.
///
/// With a rolling window of `N` days the previous period has the same length
/// and ends the day before `start`. Without one, `start` is the first of the
/// current month and the previous period is the whole prior calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

impl DateWindow {
    /// Compute the window for `today`.
    ///
    /// `Some(0)` is rejected, and so is a lookback that reaches past the
    /// earliest representable date.
    pub fn compute(today: NaiveDate, time_range: Option<u32>) -> FinopsResult<Self> {
        validate_time_range(time_range)?;

        match time_range {
            Some(days) => {
                let span = i64::from(days);
                let start = days_before(today, span)?;
                Ok(Self {
                    start,
                    end: today,
                    previous_start: days_before(start, span)?,
                    previous_end: days_before(start, 1)?,
                })
            }
            None => {
                let start = first_of_month(today);
                let previous_end = days_before(start, 1)?;
                Ok(Self {
                    start,
                    end: today,
                    previous_start: first_of_month(previous_end),
                    previous_end,
                })
            }
        }
    }

    /// Exclusive-end range for current period queries.
    ///
    /// On the first of the month `start == end`, which the billing service
    /// rejects as an empty interval, so the range widens to one day.
    pub fn current_query_range(&self) -> (NaiveDate, NaiveDate) {
        if self.end > self.start {
            (self.start, self.end)
        } else {
            (self.start, self.start + Duration::days(1))
        }
    }

    /// Exclusive-end range covering the whole previous period.
    pub fn previous_query_range(&self) -> (NaiveDate, NaiveDate) {
        (self.previous_start, self.start)
    }

    pub fn previous_days(&self) -> i64 {
        (self.previous_end - self.previous_start).num_days() + 1
    }

    pub fn current_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A lookback must cover at least one day.
pub fn validate_time_range(time_range: Option<u32>) -> FinopsResult<()> {
    match time_range {
        Some(0) => Err(FinopsError::InvalidTimeRange(0)),
        _ => Ok(()),
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_before(date: NaiveDate, days: i64) -> FinopsResult<NaiveDate> {
    date.checked_sub_signed(Duration::days(days)).ok_or_else(|| {
        FinopsError::InvalidCostCalculation(format!(
            "{} days before {} is out of the supported date range",
            days, date
        ))
    })
}

/// Human-readable names for the two periods of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLabels {
    pub current: String,
    pub previous: String,
}

impl PeriodLabels {
    pub fn for_range(time_range: Option<u32>) -> Self {
        match time_range {
            Some(days) => Self {
                current: format!("Current {} days cost", days),
                previous: format!("Previous {} days cost", days),
            },
            None => Self {
                current: "Current month's cost".to_string(),
                previous: "Last month's cost".to_string(),
            },
        }
    }
}
