//! Per-domain metric endpoints. Every route takes the dashboard filter query
//! string and answers with the rows plus the request's identity key.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use opsdash_shared::display::{days_ago, format_duration};
use opsdash_shared::{
    ClientHealthRow, ClientTimeBreakdownRow, ClientTimeTotalRow, DateRange, FilterState,
    FlexUsageRow, FohCapacityRow, FohPerformanceRow, RecentClientTaskRow, StuckTaskRow,
    LoadLevel, TaskDetailRow, TogglDetailRow,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::alerts::{
    summarize_capacity, summarize_client_health, summarize_flex_usage, summarize_performance,
    summarize_stuck_tasks, AlertCounts,
};
use crate::metrics::{DashboardQuery, MetricDomain, PerformanceStrategy};
use crate::{AppState, ApiResult};

pub const PARAM_STRATEGY: &str = "strategy";
pub const PARAM_TASK_STATUS: &str = "task_status";

#[derive(Debug, Serialize)]
pub struct MetricResponse<T> {
    pub domain: MetricDomain,
    pub query_key: String,
    pub range: DateRange,
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AlertCounts>,
}

impl<T> MetricResponse<T> {
    fn new(domain: MetricDomain, query: &DashboardQuery, rows: Vec<T>) -> Self {
        Self {
            domain,
            query_key: query.query_key(domain),
            range: query.range,
            rows,
            summary: None,
        }
    }

    fn summarized(mut self, summarize: impl Fn(&[T]) -> AlertCounts) -> Self {
        self.summary = Some(summarize(&self.rows));
        self
    }

    /// Swaps each row for its presentation view. Runs after `summarized`.
    fn present<U>(self, view: impl Fn(T) -> U) -> MetricResponse<U> {
        MetricResponse {
            domain: self.domain,
            query_key: self.query_key,
            range: self.range,
            rows: self.rows.into_iter().map(view).collect(),
            summary: self.summary,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientHealthView {
    #[serde(flatten)]
    pub row: ClientHealthRow,
    pub status_label: &'static str,
    pub last_task_label: String,
}

impl From<ClientHealthRow> for ClientHealthView {
    fn from(row: ClientHealthRow) -> Self {
        Self {
            status_label: row.health_status.display_label(),
            last_task_label: days_ago(Some(row.days_since_last_task)),
            row,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CapacityView {
    #[serde(flatten)]
    pub row: FohCapacityRow,
    pub bar_level: LoadLevel,
    pub fill_percent: u32,
}

impl From<FohCapacityRow> for CapacityView {
    fn from(row: FohCapacityRow) -> Self {
        Self {
            bar_level: row.bar_level(),
            fill_percent: row.fill_percent(),
            row,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientTimeTotalView {
    #[serde(flatten)]
    pub row: ClientTimeTotalRow,
    pub duration_label: String,
}

impl From<ClientTimeTotalRow> for ClientTimeTotalView {
    fn from(row: ClientTimeTotalRow) -> Self {
        Self {
            duration_label: format_duration(row.total_minutes),
            row,
        }
    }
}

pub(crate) fn dashboard_query(params: &BTreeMap<String, String>) -> DashboardQuery {
    DashboardQuery::now(FilterState::decode(params))
}

pub(crate) fn strategy_param(params: &BTreeMap<String, String>) -> ApiResult<PerformanceStrategy> {
    match params.get(PARAM_STRATEGY).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(value) => Ok(value.parse::<PerformanceStrategy>()?),
        None => Ok(PerformanceStrategy::default()),
    }
}

async fn client_health(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<ClientHealthView>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.client_health(&query).await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::ClientHealth, &query, rows)
            .summarized(summarize_client_health)
            .present(ClientHealthView::from),
    ))
}

async fn foh_performance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<FohPerformanceRow>>> {
    let strategy = strategy_param(&params)?;
    let query = dashboard_query(&params);
    let rows = state.aggregator.foh_performance(&query, strategy).await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::FohPerformance, &query, rows).summarized(summarize_performance),
    ))
}

async fn foh_capacity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<CapacityView>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.foh_capacity(&query).await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::FohCapacity, &query, rows)
            .summarized(summarize_capacity)
            .present(CapacityView::from),
    ))
}

async fn stuck_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<StuckTaskRow>>> {
    let query = dashboard_query(&params);
    let task_status = params.get(PARAM_TASK_STATUS).map(String::as_str);
    let rows = state.aggregator.stuck_tasks(&query, task_status).await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::StuckTasks, &query, rows).summarized(summarize_stuck_tasks),
    ))
}

async fn toggl_detail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<TogglDetailRow>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.toggl_detail(&query).await?;
    Ok(Json(MetricResponse::new(MetricDomain::TogglDetail, &query, rows)))
}

async fn client_time_totals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<ClientTimeTotalView>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.client_time_totals(&query).await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::ClientTimeTotals, &query, rows).present(ClientTimeTotalView::from),
    ))
}

async fn client_time_breakdown(
    State(state): State<Arc<AppState>>,
    Path(family_id): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<ClientTimeBreakdownRow>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.client_time_breakdown(&query, &family_id).await?;
    Ok(Json(MetricResponse::new(MetricDomain::ClientTimeBreakdown, &query, rows)))
}

async fn tasks_detail(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<TaskDetailRow>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.tasks_detail(&query).await?;
    Ok(Json(MetricResponse::new(MetricDomain::TasksDetail, &query, rows)))
}

async fn recent_tasks(
    State(state): State<Arc<AppState>>,
    Path(family_id): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<RecentClientTaskRow>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.recent_client_tasks(&family_id).await?;
    Ok(Json(MetricResponse::new(MetricDomain::RecentTasks, &query, rows)))
}

async fn flex_usage(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<Json<MetricResponse<FlexUsageRow>>> {
    let query = dashboard_query(&params);
    let rows = state.aggregator.flex_usage().await?;
    Ok(Json(
        MetricResponse::new(MetricDomain::FlexUsage, &query, rows).summarized(summarize_flex_usage),
    ))
}

pub fn metric_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/client-health", get(client_health))
        .route("/foh-performance", get(foh_performance))
        .route("/foh-capacity", get(foh_capacity))
        .route("/stuck-tasks", get(stuck_tasks))
        .route("/toggl-detail", get(toggl_detail))
        .route("/client-time-totals", get(client_time_totals))
        .route("/client-time-breakdown/:family_id", get(client_time_breakdown))
        .route("/tasks-detail", get(tasks_detail))
        .route("/recent-tasks/:family_id", get(recent_tasks))
        .route("/flex-usage", get(flex_usage))
}
