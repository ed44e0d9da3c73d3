//! AWS implementation of [`CostSession`].
//!
//! Uses the standard credential chain (environment, shared profile, SSO,
//! instance profile) through `aws-config`. Cost Explorer and STS follow the
//! session region; Budgets is pinned to [`DEFAULT_BUDGETS_REGION`] because
//! budget data is not served anywhere else.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_budgets::types::Budget as AwsBudget;
use aws_sdk_costexplorer::types::{
    DateInterval, GroupDefinition, GroupDefinitionType, ResultByTime,
};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{FinopsError, FinopsResult};
use crate::models::Budget;

use super::traits::CostSession;
use super::types::{
    CostQuery, Granularity, GroupAmount, QueryKind, TimeBucket, DEFAULT_BUDGETS_REGION,
};

/// Region used for Cost Explorer and STS when the profile sets none.
const FALLBACK_REGION: &str = "us-east-1";

const DATE_FORMAT: &str = "%Y-%m-%d";

const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "MissingAuthenticationToken",
];

const THROTTLE_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "LimitExceededException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

const UNAVAILABLE_ERROR_CODES: &[&str] = &[
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalErrorException",
    "InternalFailure",
];

/// Settings used to build an [`AwsSession`].
#[derive(Debug, Clone)]
pub struct AwsSessionConfig {
    /// Shared config profile; `None` uses the default credential chain
    pub profile: Option<String>,
    /// Region for Cost Explorer and STS
    pub region: Option<String>,
    /// Region for the Budgets client
    pub budgets_region: String,
    /// Endpoint override for local test stacks
    pub endpoint_url: Option<String>,
}

impl Default for AwsSessionConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            budgets_region: DEFAULT_BUDGETS_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

impl AwsSessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_budgets_region(mut self, region: impl Into<String>) -> Self {
        self.budgets_region = region.into();
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }
}

/// Cost Explorer, Budgets and STS clients sharing one credential source.
pub struct AwsSession {
    profile: Option<String>,
    cost_explorer: aws_sdk_costexplorer::Client,
    budgets: aws_sdk_budgets::Client,
    sts: aws_sdk_sts::Client,
}

impl AwsSession {
    pub async fn connect(config: AwsSessionConfig) -> FinopsResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let shared = loader.load().await;
        let load_failed = |message: String| FinopsError::SessionLoadFailed {
            profile: config.profile.clone().unwrap_or_else(|| "default".to_string()),
            message,
        };

        // Resolve credentials now so a bad profile fails here, not on the first query.
        let provider = shared
            .credentials_provider()
            .ok_or_else(|| load_failed("no credentials provider configured".to_string()))?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| load_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(Self::from_sdk_config(&shared, &config))
    }

    pub fn from_sdk_config(shared: &SdkConfig, config: &AwsSessionConfig) -> Self {
        let fallback = shared
            .region()
            .is_none()
            .then(|| Region::new(FALLBACK_REGION));

        let mut ce_config = aws_sdk_costexplorer::config::Builder::from(shared);
        let mut sts_config = aws_sdk_sts::config::Builder::from(shared);
        if let Some(region) = &fallback {
            ce_config = ce_config.region(region.clone());
            sts_config = sts_config.region(region.clone());
        }

        let mut budgets_config = aws_sdk_budgets::config::Builder::from(shared)
            .region(Region::new(config.budgets_region.clone()));

        if let Some(url) = &config.endpoint_url {
            ce_config = ce_config.endpoint_url(url);
            budgets_config = budgets_config.endpoint_url(url);
            sts_config = sts_config.endpoint_url(url);
        }

        Self {
            profile: config.profile.clone(),
            cost_explorer: aws_sdk_costexplorer::Client::from_conf(ce_config.build()),
            budgets: aws_sdk_budgets::Client::from_conf(budgets_config.build()),
            sts: aws_sdk_sts::Client::from_conf(sts_config.build()),
        }
    }
}

#[async_trait]
impl CostSession for AwsSession {
    fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    async fn account_id(&self) -> FinopsResult<String> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify_sdk_error(QueryKind::AccountIdentity, e))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| FinopsError::MalformedResponse {
                query: QueryKind::AccountIdentity,
                message: "caller identity has no account".to_string(),
            })
    }

    async fn get_cost_and_usage(&self, query: &CostQuery) -> FinopsResult<Vec<TimeBucket>> {
        let interval = DateInterval::builder()
            .start(query.start.format(DATE_FORMAT).to_string())
            .end(query.end.format(DATE_FORMAT).to_string())
            .build()
            .map_err(|e| FinopsError::ApiRequestFailed {
                query: query.kind,
                message: e.to_string(),
            })?;

        let granularity = match query.granularity {
            Granularity::Daily => aws_sdk_costexplorer::types::Granularity::Daily,
            Granularity::Monthly => aws_sdk_costexplorer::types::Granularity::Monthly,
        };

        let mut buckets = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut request = self
                .cost_explorer
                .get_cost_and_usage()
                .time_period(interval.clone())
                .granularity(granularity.clone())
                .metrics(query.metric);

            if let Some(dimension) = query.group_by {
                request = request.group_by(
                    GroupDefinition::builder()
                        .r#type(GroupDefinitionType::Dimension)
                        .key(dimension.key())
                        .build(),
                );
            }
            if let Some(token) = next_page_token.take() {
                request = request.next_page_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|e| classify_sdk_error(query.kind, e))?;

            for result in output.results_by_time() {
                buckets.push(parse_result_by_time(query, result)?);
            }

            match output.next_page_token() {
                Some(token) if !token.is_empty() => next_page_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(
            query = %query.kind,
            buckets = buckets.len(),
            "Cost Explorer query complete"
        );

        Ok(buckets)
    }

    async fn describe_budgets(&self, account_id: &str) -> FinopsResult<Vec<Budget>> {
        let mut budgets = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.budgets.describe_budgets().account_id(account_id);
            if let Some(token) = next_token.take() {
                request = request.next_token(token);
            }

            let output = match request.send().await {
                Ok(output) => output,
                // Accounts without any budget answer NotFound instead of an empty list.
                Err(err)
                    if err
                        .as_service_error()
                        .map(|e| e.is_not_found_exception())
                        .unwrap_or(false) =>
                {
                    break;
                }
                Err(err) => return Err(classify_sdk_error(QueryKind::Budgets, err)),
            };

            for budget in output.budgets() {
                budgets.push(parse_budget(budget)?);
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(budgets)
    }
}

fn parse_amount(query: QueryKind, raw: &str) -> FinopsResult<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FinopsError::MalformedResponse {
            query,
            message: format!("amount '{}' is not a number", raw),
        })
}

fn parse_result_by_time(query: &CostQuery, result: &ResultByTime) -> FinopsResult<TimeBucket> {
    let mut bucket = TimeBucket::new();

    if let Some(start) = result
        .time_period()
        .and_then(|tp| NaiveDate::parse_from_str(tp.start(), DATE_FORMAT).ok())
    {
        bucket = bucket.starting(start);
    }

    if let Some(metric) = result.total().and_then(|t| t.get(query.metric)) {
        if let Some(amount) = metric.amount() {
            bucket.total = Some(parse_amount(query.kind, amount)?);
        }
        bucket.unit = metric.unit().map(str::to_string);
    }

    for group in result.groups() {
        let key = group
            .keys()
            .first()
            .ok_or_else(|| FinopsError::MalformedResponse {
                query: query.kind,
                message: "group without a key".to_string(),
            })?;

        let metric = group
            .metrics()
            .and_then(|m| m.get(query.metric))
            .ok_or_else(|| FinopsError::MalformedResponse {
                query: query.kind,
                message: format!("group '{}' has no {} metric", key, query.metric),
            })?;

        let amount = metric
            .amount()
            .ok_or_else(|| FinopsError::MalformedResponse {
                query: query.kind,
                message: format!("group '{}' has no amount", key),
            })?;

        if bucket.unit.is_none() {
            bucket.unit = metric.unit().map(str::to_string);
        }

        bucket.groups.push(GroupAmount {
            key: key.clone(),
            amount: parse_amount(query.kind, amount)?,
        });
    }

    Ok(bucket)
}

fn parse_budget(budget: &AwsBudget) -> FinopsResult<Budget> {
    let name = budget.budget_name();
    let malformed = |what: &str| FinopsError::MalformedResponse {
        query: QueryKind::Budgets,
        message: format!("budget '{}' has no {}", name, what),
    };

    let limit = budget.budget_limit().ok_or_else(|| malformed("limit"))?;
    let calculated = budget
        .calculated_spend()
        .ok_or_else(|| malformed("calculated spend"))?;
    let actual = calculated
        .actual_spend()
        .ok_or_else(|| malformed("actual spend"))?;

    let forecast = calculated
        .forecasted_spend()
        .map(|spend| parse_amount(QueryKind::Budgets, spend.amount()))
        .transpose()?;

    Ok(Budget {
        name: name.to_string(),
        limit: parse_amount(QueryKind::Budgets, limit.amount())?,
        actual_spend: parse_amount(QueryKind::Budgets, actual.amount())?,
        forecast,
        unit: Some(limit.unit().to_string()).filter(|u| !u.is_empty()),
    })
}

/// Where in the request pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureStage {
    Construction,
    Timeout,
    Dispatch,
    Response,
    Service,
}

fn classify_sdk_error<E>(query: QueryKind, err: SdkError<E, HttpResponse>) -> FinopsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());

    let stage = match &err {
        SdkError::ConstructionFailure(_) => FailureStage::Construction,
        SdkError::TimeoutError(_) => FailureStage::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_user() => FailureStage::Construction,
        SdkError::DispatchFailure(_) => FailureStage::Dispatch,
        SdkError::ResponseError(_) => FailureStage::Response,
        SdkError::ServiceError(_) => FailureStage::Service,
        _ => FailureStage::Construction,
    };

    let message = DisplayErrorContext(&err).to_string();
    classify_failure(query, stage, code.as_deref(), status, message)
}

/// Map a failed request onto the error taxonomy.
pub(crate) fn classify_failure(
    query: QueryKind,
    stage: FailureStage,
    code: Option<&str>,
    status: Option<u16>,
    message: String,
) -> FinopsError {
    match stage {
        FailureStage::Timeout | FailureStage::Dispatch => {
            return FinopsError::ServiceUnavailable { query, message }
        }
        FailureStage::Response => return FinopsError::MalformedResponse { query, message },
        FailureStage::Construction => return FinopsError::ApiRequestFailed { query, message },
        FailureStage::Service => {}
    }

    let code = code.unwrap_or_default();

    if AUTH_ERROR_CODES.contains(&code) || matches!(status, Some(401) | Some(403)) {
        FinopsError::AuthorizationFailed { query, message }
    } else if THROTTLE_ERROR_CODES.contains(&code) || status == Some(429) {
        FinopsError::Throttled { query, message }
    } else if UNAVAILABLE_ERROR_CODES.contains(&code) || status.is_some_and(|s| s >= 500) {
        FinopsError::ServiceUnavailable { query, message }
    } else {
        FinopsError::ApiRequestFailed { query, message }
    }
}
