use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use opsdash_shared::FilterState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use super::fixtures::ScriptedSource;
use crate::metrics::{ClassificationRules, DashboardQuery, MetricsAggregator};
use crate::source::DataSource;
use crate::{build_router, AppState};

/// Fixed clock for pipeline tests: Friday 2024-03-15, 09:00.
pub fn as_of() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn query(filters: FilterState) -> DashboardQuery {
    DashboardQuery::new(filters, as_of())
}

pub fn aggregator(source: &Arc<ScriptedSource>) -> MetricsAggregator {
    let source: Arc<dyn DataSource> = source.clone();
    MetricsAggregator::new(source, ClassificationRules::default())
}

pub fn test_app(source: &Arc<ScriptedSource>) -> Router {
    build_router(Arc::new(AppState {
        aggregator: aggregator(source),
    }))
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
