use async_trait::async_trait;

use crate::error::FinopsResult;
use crate::models::Budget;

use super::types::{CostQuery, TimeBucket};

/// An authenticated handle able to issue the billing, budget and identity
/// queries a cost report needs.
///
/// Every method is a single read-only request (following pagination where
/// the service paginates). Implementations must not retry or swallow
/// failures.
#[async_trait]
pub trait CostSession: Send + Sync {
    /// Named profile the session was built from, if any.
    fn profile_name(&self) -> Option<&str> {
        None
    }

    async fn account_id(&self) -> FinopsResult<String>;

    async fn get_cost_and_usage(&self, query: &CostQuery) -> FinopsResult<Vec<TimeBucket>>;

    async fn describe_budgets(&self, account_id: &str) -> FinopsResult<Vec<Budget>>;
}
