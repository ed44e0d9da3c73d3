use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use finops_core::{
    get_cost_data_on, Budget, CostAggregator, CostQuery, CostSession, FinopsError, FinopsResult,
    Granularity, QueryKind, TimeBucket,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory billing backend that records every query it receives.
#[derive(Default)]
struct FakeSession {
    current: Vec<TimeBucket>,
    previous: Vec<TimeBucket>,
    by_service: Vec<TimeBucket>,
    budgets: Vec<Budget>,
    fail_on: Option<QueryKind>,
    queries: Mutex<Vec<CostQuery>>,
    budget_accounts: Mutex<Vec<String>>,
}

impl FakeSession {
    fn failure(query: QueryKind) -> FinopsError {
        match query {
            QueryKind::Budgets => FinopsError::AuthorizationFailed {
                query,
                message: "AccessDeniedException".to_string(),
            },
            _ => FinopsError::Throttled {
                query,
                message: "Rate exceeded".to_string(),
            },
        }
    }

    fn recorded(&self) -> Vec<CostQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn recorded_kind(&self, kind: QueryKind) -> CostQuery {
        self.recorded()
            .into_iter()
            .find(|q| q.kind == kind)
            .expect("query was not issued")
    }
}

#[async_trait]
impl CostSession for FakeSession {
    fn profile_name(&self) -> Option<&str> {
        Some("test")
    }

    async fn account_id(&self) -> FinopsResult<String> {
        if self.fail_on == Some(QueryKind::AccountIdentity) {
            return Err(FinopsError::AuthorizationFailed {
                query: QueryKind::AccountIdentity,
                message: "ExpiredToken".to_string(),
            });
        }
        Ok("123456789012".to_string())
    }

    async fn get_cost_and_usage(&self, query: &CostQuery) -> FinopsResult<Vec<TimeBucket>> {
        self.queries.lock().unwrap().push(query.clone());

        if self.fail_on == Some(query.kind) {
            return Err(Self::failure(query.kind));
        }

        Ok(match query.kind {
            QueryKind::CurrentPeriodTotal => self.current.clone(),
            QueryKind::PreviousPeriodTotal => self.previous.clone(),
            QueryKind::CostByService => self.by_service.clone(),
            _ => Vec::new(),
        })
    }

    async fn describe_budgets(&self, account_id: &str) -> FinopsResult<Vec<Budget>> {
        self.budget_accounts
            .lock()
            .unwrap()
            .push(account_id.to_string());

        if self.fail_on == Some(QueryKind::Budgets) {
            return Err(Self::failure(QueryKind::Budgets));
        }
        Ok(self.budgets.clone())
    }
}

fn populated_session() -> FakeSession {
    FakeSession {
        current: vec![TimeBucket::new().with_total(15.0012).with_unit("USD")],
        previous: vec![TimeBucket::new().with_total(12.5).with_unit("USD")],
        by_service: vec![
            TimeBucket::new()
                .starting(date(2024, 3, 1))
                .with_group("EC2", 10.0)
                .with_group("S3", 0.0005),
            TimeBucket::new()
                .starting(date(2024, 3, 2))
                .with_group("EC2", 5.0)
                .with_group("S3", 0.0007),
        ],
        budgets: vec![Budget::new("Monthly", 100.0, 15.0).with_forecast(45.0)],
        ..FakeSession::default()
    }
}

mod summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_for_calendar_month() {
        let session = populated_session();
        let summary = get_cost_data_on(&session, date(2024, 3, 15), None)
            .await
            .unwrap();

        assert_eq!(summary.account_id, "123456789012");
        assert!((summary.current_period_total - 15.0012).abs() < 1e-9);
        assert!((summary.previous_period_total - 12.5).abs() < 1e-9);
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.time_range, None);
        assert_eq!(summary.period_labels.current, "Current month's cost");
        assert_eq!(summary.period_labels.previous, "Last month's cost");

        let services: Vec<&str> = summary
            .current_period_cost_by_service
            .iter()
            .map(|s| s.service_name.as_str())
            .collect();
        assert_eq!(services, vec!["EC2", "S3"]);
        assert!((summary.current_period_cost_by_service[0].amount - 15.0).abs() < 1e-9);
        assert!((summary.current_period_cost_by_service[1].amount - 0.0012).abs() < 1e-9);

        assert_eq!(summary.budgets.len(), 1);
        assert_eq!(summary.budgets[0].forecast, Some(45.0));
    }

    #[tokio::test]
    async fn test_calendar_month_queries() {
        let session = populated_session();
        get_cost_data_on(&session, date(2024, 3, 15), None)
            .await
            .unwrap();

        let queries = session.recorded();
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|q| q.metric == "UnblendedCost"));

        let current = session.recorded_kind(QueryKind::CurrentPeriodTotal);
        assert_eq!((current.start, current.end), (date(2024, 3, 1), date(2024, 3, 15)));
        assert_eq!(current.granularity, Granularity::Monthly);
        assert!(current.group_by.is_none());

        let previous = session.recorded_kind(QueryKind::PreviousPeriodTotal);
        assert_eq!((previous.start, previous.end), (date(2024, 2, 1), date(2024, 3, 1)));

        let by_service = session.recorded_kind(QueryKind::CostByService);
        assert_eq!(by_service.granularity, Granularity::Monthly);
        assert!(by_service.group_by.is_some());

        assert_eq!(
            *session.budget_accounts.lock().unwrap(),
            vec!["123456789012".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rolling_window_uses_daily_granularity() {
        let session = populated_session();
        let summary = get_cost_data_on(&session, date(2024, 3, 15), Some(30))
            .await
            .unwrap();

        assert_eq!(summary.window.start, date(2024, 2, 14));
        assert_eq!(summary.window.end, date(2024, 3, 15));
        assert_eq!(summary.window.previous_start, date(2024, 1, 15));
        assert_eq!(summary.window.previous_end, date(2024, 2, 13));
        assert_eq!(summary.period_labels.current, "Current 30 days cost");
        assert_eq!(summary.time_range, Some(30));

        let by_service = session.recorded_kind(QueryKind::CostByService);
        assert_eq!(by_service.granularity, Granularity::Daily);
        assert_eq!(
            (by_service.start, by_service.end),
            (date(2024, 2, 14), date(2024, 3, 15))
        );

        let previous = session.recorded_kind(QueryKind::PreviousPeriodTotal);
        assert_eq!(
            (previous.start, previous.end),
            (date(2024, 1, 15), date(2024, 2, 14))
        );
        assert_eq!(
            session.recorded_kind(QueryKind::CurrentPeriodTotal).granularity,
            Granularity::Monthly
        );
    }

    #[tokio::test]
    async fn test_empty_account() {
        let session = FakeSession::default();
        let summary = get_cost_data_on(&session, date(2024, 3, 15), Some(7))
            .await
            .unwrap();

        assert_eq!(summary.current_period_total, 0.0);
        assert_eq!(summary.previous_period_total, 0.0);
        assert!(summary.current_period_cost_by_service.is_empty());
        assert!(summary.budgets.is_empty());
        assert_eq!(summary.currency, "USD");
        assert_eq!(summary.period_change_percent(), None);
    }

    #[tokio::test]
    async fn test_aggregator_with_pinned_date() {
        let session: Arc<dyn CostSession> = Arc::new(populated_session());
        let aggregator = CostAggregator::new(session).with_today(date(2024, 1, 10));

        let summary = aggregator.get_cost_data(None).await.unwrap();

        assert_eq!(summary.window.start, date(2024, 1, 1));
        assert_eq!(summary.window.previous_start, date(2023, 12, 1));
        assert_eq!(summary.window.previous_end, date(2023, 12, 31));
        assert_eq!(aggregator.session().profile_name(), Some("test"));
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_time_range_rejected_before_queries() {
        let session = populated_session();
        let result = get_cost_data_on(&session, date(2024, 3, 15), Some(0)).await;

        assert!(matches!(result, Err(FinopsError::InvalidTimeRange(0))));
        assert!(session.recorded().is_empty());
        assert!(session.budget_accounts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_propagates() {
        let session = FakeSession {
            fail_on: Some(QueryKind::AccountIdentity),
            ..populated_session()
        };
        let err = get_cost_data_on(&session, date(2024, 3, 15), None)
            .await
            .unwrap_err();

        assert_eq!(err.query_kind(), Some(QueryKind::AccountIdentity));
        assert!(session.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_cost_query_failure_is_fatal() {
        for kind in [
            QueryKind::CurrentPeriodTotal,
            QueryKind::PreviousPeriodTotal,
            QueryKind::CostByService,
        ] {
            let session = FakeSession {
                fail_on: Some(kind),
                ..populated_session()
            };
            let err = get_cost_data_on(&session, date(2024, 3, 15), Some(14))
                .await
                .unwrap_err();

            assert!(matches!(err, FinopsError::Throttled { .. }));
            assert_eq!(err.query_kind(), Some(kind));
            assert!(err.is_transient());
        }
    }

    #[tokio::test]
    async fn test_budget_failure_is_fatal() {
        let session = FakeSession {
            fail_on: Some(QueryKind::Budgets),
            ..populated_session()
        };
        let err = get_cost_data_on(&session, date(2024, 3, 15), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FinopsError::AuthorizationFailed {
                query: QueryKind::Budgets,
                ..
            }
        ));
        assert!(!err.is_transient());
    }
}
