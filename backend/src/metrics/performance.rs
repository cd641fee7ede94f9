use std::collections::HashMap;
use std::str::FromStr;

use opsdash_shared::{ClientHealthRow, FohPerformanceRow, HealthStatus};
use serde::{Deserialize, Serialize};

use super::rules::{
    performance_status_from_clients, ClassificationRules, ACTIVE_FAMILY_STATUS, FOH_ASSISTANT_TYPE,
};
use super::{text_list, DashboardQuery, MetricDomain, MetricsAggregator, MetricsError, MetricsResult};
use crate::normalize::{to_display_assistant_name, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

pub const PERFORMANCE_VIEW: &str = "foh_performance";

/// How an assistant's performance status is derived. The two are separate
/// policies and are never blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStrategy {
    /// Average logged minutes per completed task against fixed thresholds.
    #[default]
    Threshold,
    /// Worst health status among the assistant's clients.
    ClientHealth,
}

impl PerformanceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::ClientHealth => "client_health",
        }
    }
}

impl FromStr for PerformanceStrategy {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "threshold" => Ok(Self::Threshold),
            "client_health" => Ok(Self::ClientHealth),
            other => Err(MetricsError::InvalidRequest(format!(
                "Unknown performance strategy '{}'",
                other
            ))),
        }
    }
}

fn performance_sql(minutes_column: &str) -> String {
    format!(
        r#"
    WITH completed AS (
        SELECT t.assistant_id, COUNT(*) AS tasks_completed
        FROM tasks t
        WHERE t.closed_at >= $1::timestamp AND t.closed_at <= $2::timestamp
          AND t.family_id::text <> ALL($3::text[])
          AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($4::text[]))
        GROUP BY t.assistant_id
    ),
    toggl_stats AS (
        SELECT
            t.assistant_id,
            ROUND(SUM(te.{minutes_column})::numeric / COUNT(DISTINCT t.id), 1) AS avg_mins_per_task
        FROM tasks t
        JOIN toggl_entries te ON te.task_id = t.id
        WHERE t.closed_at >= $1::timestamp AND t.closed_at <= $2::timestamp
          AND t.family_id::text <> ALL($3::text[])
          AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($4::text[]))
        GROUP BY t.assistant_id
    ),
    clients AS (
        SELECT f.assistant_id, COUNT(*) AS client_count
        FROM families f
        WHERE f.system_status = $6
        GROUP BY f.assistant_id
    )
    SELECT
        a.id AS assistant_id,
        a.name AS assistant_name,
        COALESCE(c.tasks_completed, 0) AS tasks_completed,
        COALESCE(ts.avg_mins_per_task, 0) AS avg_mins_per_task,
        COALESCE(cl.client_count, 0) AS client_count
    FROM assistants a
    LEFT JOIN completed c ON c.assistant_id = a.id
    LEFT JOIN toggl_stats ts ON ts.assistant_id = a.id
    LEFT JOIN clients cl ON cl.assistant_id = a.id
    WHERE a.type = $5
      AND (cardinality($7::text[]) = 0 OR a.id::text = ANY($7::text[]))
    ORDER BY a.name
"#
    )
}

impl MetricsAggregator {
    pub async fn foh_performance(
        &self,
        query: &DashboardQuery,
        strategy: PerformanceStrategy,
    ) -> MetricsResult<Vec<FohPerformanceRow>> {
        let predicate = query.predicate();
        let (start, end) = query.timestamp_params();
        self.log_filters(PERFORMANCE_VIEW, (&predicate.assistant_ids, &start, &end, strategy));

        let rules = self.rules();
        let params = [
            start,
            end,
            text_list(&rules.internal_family_ids),
            text_list(&rules.excluded_completion_sources),
            SqlParam::Text(Some(FOH_ASSISTANT_TYPE.to_string())),
            SqlParam::Text(Some(ACTIVE_FAMILY_STATUS.to_string())),
            predicate.assistants(),
        ];
        let plan = QueryPlan::new(
            SourceQuery::new(PERFORMANCE_VIEW, "canonical", performance_sql("duration_minutes"))
                .bind_all(params.clone()),
        )
        .with_adapter(
            SourceQuery::new(PERFORMANCE_VIEW, "minutes_column", performance_sql("minutes"))
                .bind_all(params),
        );
        let rows = self.run(MetricDomain::FohPerformance, plan).await?;

        match strategy {
            PerformanceStrategy::Threshold => Ok(performance_by_threshold(&rows, rules)),
            PerformanceStrategy::ClientHealth => {
                // Every client of the assistant counts, whatever the status filter says.
                let mut unfiltered = query.clone();
                unfiltered.filters.status.clear();
                let clients = self.client_health(&unfiltered).await?;
                Ok(performance_by_client_health(&rows, &clients))
            }
        }
    }
}

fn base_row(row: &RawRow) -> FohPerformanceRow {
    FohPerformanceRow {
        assistant_id: row.text("assistant_id"),
        assistant_name: to_display_assistant_name(&row.text("assistant_name")),
        tasks_completed: row.number("tasks_completed"),
        active_tasks: 0.0,
        avg_mins_per_task: row.number("avg_mins_per_task"),
        client_count: row.number("client_count"),
        red_clients: 0,
        amber_clients: 0,
        performance_status: Default::default(),
    }
}

pub fn performance_by_threshold(rows: &[RawRow], rules: &ClassificationRules) -> Vec<FohPerformanceRow> {
    rows.iter()
        .map(|row| {
            let mut out = base_row(row);
            out.performance_status = rules.performance_status(out.avg_mins_per_task);
            out
        })
        .collect()
}

pub fn performance_by_client_health(
    rows: &[RawRow],
    clients: &[ClientHealthRow],
) -> Vec<FohPerformanceRow> {
    #[derive(Default)]
    struct Tally {
        red: u32,
        amber: u32,
        active_tasks: f64,
    }

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for client in clients {
        let tally = tallies.entry(client.assistant_id.as_str()).or_default();
        tally.active_tasks += client.active_tasks;
        match client.health_status {
            HealthStatus::Red => tally.red += 1,
            HealthStatus::Amber => tally.amber += 1,
            HealthStatus::Green | HealthStatus::Purple => {}
        }
    }

    rows.iter()
        .map(|row| {
            let mut out = base_row(row);
            if let Some(tally) = tallies.get(out.assistant_id.as_str()) {
                out.red_clients = tally.red;
                out.amber_clients = tally.amber;
                out.active_tasks = tally.active_tasks;
            }
            out.performance_status = performance_status_from_clients(out.red_clients, out.amber_clients);
            out
        })
        .collect()
}
