use axum::{extract::State, response::Json, routing::get, Router};
use opsdash_shared::{AssistantRow, DashboardAlertsRow, FamilyRow};
use std::sync::Arc;

use crate::{AppState, ApiResult};

async fn list_assistants(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AssistantRow>>> {
    Ok(Json(state.aggregator.assistants().await?))
}

async fn list_families(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<FamilyRow>>> {
    Ok(Json(state.aggregator.families().await?))
}

async fn list_dashboard_alerts(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DashboardAlertsRow>>> {
    Ok(Json(state.aggregator.dashboard_alerts().await?))
}

pub fn lookup_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assistants", get(list_assistants))
        .route("/families", get(list_families))
        .route("/dashboard-alerts", get(list_dashboard_alerts))
}
