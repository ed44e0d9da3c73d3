use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::billing::{
    reported_unit, sum_bucket_totals, CostQuery, CostSession, Granularity, QueryKind, TimeBucket,
    DEFAULT_CURRENCY,
};
use crate::error::FinopsResult;
use crate::models::{CostSummary, DateWindow, PeriodLabels, ServiceCost};

/// Services below this amount (native currency unit) are dropped as noise.
pub const MIN_SERVICE_COST: f64 = 0.001;

/// Sum every group amount across all buckets, keyed by service name.
pub fn aggregate_service_costs(buckets: &[TimeBucket]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for bucket in buckets {
        for group in &bucket.groups {
            *totals.entry(group.key.clone()).or_insert(0.0) += group.amount;
        }
    }
    totals
}

/// Drop services under [`MIN_SERVICE_COST`] and sort the rest by amount,
/// highest first. Equal amounts are ordered by name.
pub fn process_service_costs(totals: HashMap<String, f64>) -> Vec<ServiceCost> {
    let mut services: Vec<ServiceCost> = totals
        .into_iter()
        .filter(|(_, amount)| *amount >= MIN_SERVICE_COST)
        .map(|(service_name, amount)| ServiceCost {
            service_name,
            amount,
        })
        .collect();

    services.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.service_name.cmp(&b.service_name))
    });
    services
}

/// Builds [`CostSummary`] values from a billing session.
pub struct CostAggregator {
    session: Arc<dyn CostSession>,
    today: Option<NaiveDate>,
}

impl CostAggregator {
    pub fn new(session: Arc<dyn CostSession>) -> Self {
        Self {
            session,
            today: None,
        }
    }

    /// Pin the reference date instead of using the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn session(&self) -> &Arc<dyn CostSession> {
        &self.session
    }

    pub async fn get_cost_data(&self, time_range: Option<u32>) -> FinopsResult<CostSummary> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        get_cost_data_on(self.session.as_ref(), today, time_range).await
    }
}

/// Cost summary for the session's account relative to today's local date.
pub async fn get_cost_data(
    session: &dyn CostSession,
    time_range: Option<u32>,
) -> FinopsResult<CostSummary> {
    get_cost_data_on(session, Local::now().date_naive(), time_range).await
}

/// Cost summary relative to a fixed `today`.
///
/// Every query must succeed; the first failure is returned unchanged.
pub async fn get_cost_data_on(
    session: &dyn CostSession,
    today: NaiveDate,
    time_range: Option<u32>,
) -> FinopsResult<CostSummary> {
    let window = DateWindow::compute(today, time_range)?;
    let account_id = session.account_id().await?;

    let (current_start, current_end) = window.current_query_range();
    let (previous_start, previous_end) = window.previous_query_range();

    let granularity = if time_range.is_some() {
        Granularity::Daily
    } else {
        Granularity::Monthly
    };

    let current_query = CostQuery::total(QueryKind::CurrentPeriodTotal, current_start, current_end);
    let previous_query =
        CostQuery::total(QueryKind::PreviousPeriodTotal, previous_start, previous_end);
    let by_service_query = CostQuery::grouped_by_service(current_start, current_end, granularity);

    let (current, previous, by_service, budgets) = tokio::try_join!(
        session.get_cost_and_usage(&current_query),
        session.get_cost_and_usage(&previous_query),
        session.get_cost_and_usage(&by_service_query),
        session.describe_budgets(&account_id),
    )?;

    let services = process_service_costs(aggregate_service_costs(&by_service));

    let currency = reported_unit(&current)
        .or_else(|| reported_unit(&by_service))
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string();

    let summary = CostSummary {
        account_id,
        current_period_total: sum_bucket_totals(&current),
        previous_period_total: sum_bucket_totals(&previous),
        current_period_cost_by_service: services,
        budgets,
        period_labels: PeriodLabels::for_range(time_range),
        time_range,
        window,
        currency,
    };

    debug!(
        account_id = %summary.account_id,
        current = summary.current_period_total,
        previous = summary.previous_period_total,
        services = summary.current_period_cost_by_service.len(),
        budgets = summary.budgets.len(),
        "Cost data retrieved"
    );

    Ok(summary)
}
