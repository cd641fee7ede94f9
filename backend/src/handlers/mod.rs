use axum::{extract::State, http::StatusCode, response::Json, Router};
use serde_json::json;
use std::sync::Arc;

use crate::{AppError, AppState, ApiResult};

pub mod dashboard;
pub mod filters;
pub mod lookups;
pub mod metrics;

pub use dashboard::dashboard_routes;
pub use filters::filter_routes;
pub use lookups::lookup_routes;
pub use metrics::metric_routes;

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    state.aggregator.ping().await.map_err(|err| {
        tracing::warn!(error = %err, "Data source health check failed");
        AppError::ServiceUnavailable("Data source unreachable".to_string())
    })?;
    Ok((StatusCode::OK, Json(json!({"status": "healthy", "service": "opsdash-api"}))))
}

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/dashboard", dashboard_routes())
        .nest("/filters", filter_routes())
        .nest("/metrics", metric_routes())
        .nest("/lookups", lookup_routes())
}
