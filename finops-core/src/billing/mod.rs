mod aws;
mod traits;
mod types;

pub use aws::{AwsSession, AwsSessionConfig};
pub use traits::CostSession;
pub use types::{
    reported_unit, sum_bucket_totals, CostQuery, Granularity, GroupAmount, GroupDimension,
    QueryKind, TimeBucket, DEFAULT_BUDGETS_REGION, DEFAULT_CURRENCY, UNBLENDED_COST,
};
