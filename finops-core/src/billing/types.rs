use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cost metric used for every query: billed cost without amortized
/// commitment discounts spread across usage.
pub const UNBLENDED_COST: &str = "UnblendedCost";

/// Budget data is only served from this region.
pub const DEFAULT_BUDGETS_REGION: &str = "us-east-1";

/// Currency reported when the service omits a unit.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Which outbound request a result or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    AccountIdentity,
    CurrentPeriodTotal,
    PreviousPeriodTotal,
    CostByService,
    Budgets,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::AccountIdentity => "account identity",
            QueryKind::CurrentPeriodTotal => "current period cost",
            QueryKind::PreviousPeriodTotal => "previous period cost",
            QueryKind::CostByService => "cost by service",
            QueryKind::Budgets => "budgets",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimension a cost query can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupDimension {
    Service,
}

impl GroupDimension {
    pub fn key(&self) -> &'static str {
        match self {
            GroupDimension::Service => "SERVICE",
        }
    }
}

/// A single Cost Explorer request. `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub kind: QueryKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
    pub metric: &'static str,
    pub group_by: Option<GroupDimension>,
}

impl CostQuery {
    /// Ungrouped monthly query whose bucket totals sum to the period spend.
    pub fn total(kind: QueryKind, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            kind,
            start,
            end,
            granularity: Granularity::Monthly,
            metric: UNBLENDED_COST,
            group_by: None,
        }
    }

    pub fn grouped_by_service(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Self {
        Self {
            kind: QueryKind::CostByService,
            start,
            end,
            granularity,
            metric: UNBLENDED_COST,
            group_by: Some(GroupDimension::Service),
        }
    }
}

/// One `{group_key, amount}` pair inside a time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAmount {
    pub key: String,
    pub amount: f64,
}

/// One time bucket of a cost query response.
///
/// Ungrouped queries fill `total`; grouped queries fill `groups` and usually
/// leave `total` empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub start: Option<NaiveDate>,
    pub total: Option<f64>,
    pub unit: Option<String>,
    pub groups: Vec<GroupAmount>,
}

impl TimeBucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_total(mut self, amount: f64) -> Self {
        self.total = Some(amount);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_group(mut self, key: impl Into<String>, amount: f64) -> Self {
        self.groups.push(GroupAmount {
            key: key.into(),
            amount,
        });
        self
    }
}

/// Sum of every bucket total. Buckets without a total contribute nothing.
pub fn sum_bucket_totals(buckets: &[TimeBucket]) -> f64 {
    buckets.iter().filter_map(|b| b.total).sum()
}

/// First currency unit reported by any bucket.
pub fn reported_unit(buckets: &[TimeBucket]) -> Option<&str> {
    buckets.iter().find_map(|b| b.unit.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_total_query_uses_monthly_unblended() {
        let query = CostQuery::total(
            QueryKind::PreviousPeriodTotal,
            date(2024, 1, 1),
            date(2024, 2, 1),
        );
        assert_eq!(query.granularity, Granularity::Monthly);
        assert_eq!(query.metric, "UnblendedCost");
        assert!(query.group_by.is_none());
    }

    #[test]
    fn test_grouped_query() {
        let query =
            CostQuery::grouped_by_service(date(2024, 3, 1), date(2024, 3, 15), Granularity::Daily);
        assert_eq!(query.kind, QueryKind::CostByService);
        assert_eq!(query.group_by.map(|g| g.key()), Some("SERVICE"));
        assert_eq!(query.granularity.as_str(), "DAILY");
    }

    #[test]
    fn test_sum_bucket_totals_skips_missing() {
        let buckets = vec![
            TimeBucket::new().with_total(12.5),
            TimeBucket::new(),
            TimeBucket::new().with_total(0.25),
        ];
        assert!((sum_bucket_totals(&buckets) - 12.75).abs() < 1e-9);
        assert_eq!(sum_bucket_totals(&[]), 0.0);
    }

    #[test]
    fn test_reported_unit() {
        let buckets = vec![TimeBucket::new(), TimeBucket::new().with_unit("USD")];
        assert_eq!(reported_unit(&buckets), Some("USD"));
        assert_eq!(reported_unit(&[TimeBucket::new()]), None);
    }

    #[test]
    fn test_query_kind_display() {
        assert_eq!(QueryKind::CostByService.to_string(), "cost by service");
        assert_eq!(
            serde_json::to_string(&QueryKind::AccountIdentity).unwrap(),
            "\"account_identity\""
        );
    }
}
