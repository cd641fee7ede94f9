use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::metrics::{dashboard_query, strategy_param};
use crate::dashboard::{load_snapshot, DashboardSnapshot};
use crate::{AppState, ApiResult};

/// Partial failures are reported in the snapshot's `errors`, so this only
/// fails on a malformed request.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<DashboardSnapshot>> {
    let strategy = strategy_param(&params)?;
    let query = dashboard_query(&params);
    Ok(Json(load_snapshot(&state.aggregator, &query, strategy).await))
}

pub fn dashboard_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_dashboard))
}
