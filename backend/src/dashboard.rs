//! One dashboard refresh: every domain fetched concurrently, then rolled up
//! into alert cards. A failing domain is reported and left out; the others
//! still render.

use std::collections::BTreeMap;

use opsdash_shared::{
    ClientHealthRow, DateRange, FohPerformanceRow, HealthStatus, PerformanceStatus,
    StuckTaskRow,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::alerts::{
    summarize_capacity, summarize_client_health, summarize_performance, summarize_stuck_tasks,
    AlertBoard, AlertCounts, CAPACITY_ALIASES, CLIENT_HEALTH_ALIASES, PERFORMANCE_ALIASES,
    STUCK_TASKS_ALIASES,
};
use crate::metrics::{
    DashboardQuery, MetricDomain, MetricsAggregator, MetricsResult, PerformanceStrategy,
};

/// Rows shown in each "needs attention" list.
pub const HIGHLIGHT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    ClientHealth,
    Performance,
    StuckTasks,
    Capacity,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 4] = [
        Self::ClientHealth,
        Self::Performance,
        Self::StuckTasks,
        Self::Capacity,
    ];

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::ClientHealth => CLIENT_HEALTH_ALIASES,
            Self::Performance => PERFORMANCE_ALIASES,
            Self::StuckTasks => STUCK_TASKS_ALIASES,
            Self::Capacity => CAPACITY_ALIASES,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ClientHealth => "Client Health",
            Self::Performance => "Assistant Performance",
            Self::StuckTasks => "Stuck Tasks",
            Self::Capacity => "Capacity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCard {
    pub category: AlertCategory,
    pub title: String,
    #[serde(flatten)]
    pub counts: AlertCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub cycle_id: Uuid,
    pub query_key: String,
    pub range: DateRange,
    pub alerts: Vec<AlertCard>,
    pub attention_clients: Vec<ClientHealthRow>,
    pub flagged_assistants: Vec<FohPerformanceRow>,
    pub stuck_tasks: Vec<StuckTaskRow>,
    /// Domains that failed this cycle, with the error message.
    pub errors: BTreeMap<MetricDomain, String>,
}

/// Fetch every dashboard domain concurrently and assemble the snapshot.
pub async fn load_snapshot(
    aggregator: &MetricsAggregator,
    query: &DashboardQuery,
    strategy: PerformanceStrategy,
) -> DashboardSnapshot {
    let cycle_id = Uuid::new_v4();
    let span = tracing::info_span!("dashboard_cycle", %cycle_id, range = %query.range);

    async move {
        let (view_rows, clients, performance, stuck, capacity) = tokio::join!(
            aggregator.dashboard_alerts(),
            aggregator.client_health(query),
            aggregator.foh_performance(query, strategy),
            aggregator.stuck_tasks(query, None),
            aggregator.foh_capacity(query),
        );

        let mut errors = BTreeMap::new();
        let view_rows = settle(MetricDomain::DashboardAlerts, view_rows, &mut errors);
        let clients = settle(MetricDomain::ClientHealth, clients, &mut errors);
        let performance = settle(MetricDomain::FohPerformance, performance, &mut errors);
        let stuck = settle(MetricDomain::StuckTasks, stuck, &mut errors);
        let capacity = settle(MetricDomain::FohCapacity, capacity, &mut errors);

        let mut board = AlertBoard::from_view_rows(view_rows.as_deref().unwrap_or_default());
        if let Some(rows) = &clients {
            board.set_computed(CLIENT_HEALTH_ALIASES[0], summarize_client_health(rows));
        }
        if let Some(rows) = &performance {
            board.set_computed(PERFORMANCE_ALIASES[0], summarize_performance(rows));
        }
        if let Some(rows) = &stuck {
            board.set_computed(STUCK_TASKS_ALIASES[0], summarize_stuck_tasks(rows));
        }
        if let Some(rows) = &capacity {
            board.set_fallback(CAPACITY_ALIASES, summarize_capacity(rows));
        }

        let alerts = AlertCategory::ALL
            .iter()
            .map(|category| AlertCard {
                category: *category,
                title: category.title().to_string(),
                counts: board.lookup(category.aliases()),
            })
            .collect();

        tracing::info!(failed = errors.len(), "Dashboard cycle complete");

        DashboardSnapshot {
            cycle_id,
            query_key: query.query_key(MetricDomain::Dashboard),
            range: query.range,
            alerts,
            attention_clients: clients
                .unwrap_or_default()
                .into_iter()
                .filter(|r| r.health_status != HealthStatus::Green)
                .take(HIGHLIGHT_LIMIT)
                .collect(),
            flagged_assistants: performance
                .unwrap_or_default()
                .into_iter()
                .filter(|r| r.performance_status != PerformanceStatus::Green)
                .take(HIGHLIGHT_LIMIT)
                .collect(),
            stuck_tasks: stuck.unwrap_or_default().into_iter().take(HIGHLIGHT_LIMIT).collect(),
            errors,
        }
    }
    .instrument(span)
    .await
}

fn settle<T>(
    domain: MetricDomain,
    result: MetricsResult<Vec<T>>,
    errors: &mut BTreeMap<MetricDomain, String>,
) -> Option<Vec<T>> {
    match result {
        Ok(rows) => Some(rows),
        Err(err) => {
            tracing::error!(%domain, error = %err, "Dashboard domain failed");
            errors.insert(domain, err.to_string());
            None
        }
    }
}
