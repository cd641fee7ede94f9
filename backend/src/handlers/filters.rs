use axum::{
    extract::Query,
    response::Json,
    routing::get,
    Router,
};
use opsdash_shared::{DateRange, FilterState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::metrics::{DashboardQuery, MetricDomain};
use crate::AppState;

/// The canonical form of a filter query string, with its resolved range.
#[derive(Debug, Serialize)]
pub struct ResolvedFilters {
    pub filters: FilterState,
    pub query_string: String,
    pub query_key: String,
    pub range: DateRange,
    pub days: i64,
    pub start_timestamp: String,
    pub end_timestamp: String,
}

impl ResolvedFilters {
    pub fn from_query(query: &DashboardQuery) -> Self {
        let (start_timestamp, end_timestamp) = query.range.timestamp_bounds();
        Self {
            query_string: query.filters.to_query_string(),
            query_key: query.query_key(MetricDomain::Dashboard),
            filters: query.filters.clone(),
            range: query.range,
            days: query.range.num_days(),
            start_timestamp,
            end_timestamp,
        }
    }
}

async fn resolve_filters(Query(params): Query<BTreeMap<String, String>>) -> Json<ResolvedFilters> {
    let query = DashboardQuery::now(FilterState::decode(&params));
    Json(ResolvedFilters::from_query(&query))
}

pub fn filter_routes() -> Router<Arc<AppState>> {
    Router::new().route("/resolve", get(resolve_filters))
}
