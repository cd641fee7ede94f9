//! Client health: the primary `v_client_health` view, topped up from a task
//! activity aggregate when the view leaves activity columns empty.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use opsdash_shared::{ClientHealthRow, HealthStatus};

use super::rules::NEVER_ACTIVE_SENTINEL_DAYS;
use super::{text_list, DashboardQuery, MetricDomain, MetricsAggregator, MetricsResult};
use crate::normalize::{to_display_assistant_name, to_timestamp, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery};

pub const CLIENT_HEALTH_VIEW: &str = "v_client_health";

const CLIENT_HEALTH_SQL: &str = r#"
    SELECT *
    FROM v_client_health
    WHERE (cardinality($1::text[]) = 0 OR assistant_id::text = ANY($1::text[]))
      AND (cardinality($2::text[]) = 0 OR family_id::text = ANY($2::text[]))
      AND (cardinality($3::text[]) = 0 OR COALESCE(subscription_type, contract)::text = ANY($3::text[]))
    ORDER BY days_since_last_task DESC
"#;

// Older views have no subscription_type column.
const CLIENT_HEALTH_CONTRACT_ONLY_SQL: &str = r#"
    SELECT *
    FROM v_client_health
    WHERE (cardinality($1::text[]) = 0 OR assistant_id::text = ANY($1::text[]))
      AND (cardinality($2::text[]) = 0 OR family_id::text = ANY($2::text[]))
      AND (cardinality($3::text[]) = 0 OR contract::text = ANY($3::text[]))
    ORDER BY days_since_last_task DESC
"#;

const FAMILY_ACTIVITY_SQL: &str = r#"
    SELECT
        t.family_id::text AS family_id,
        COUNT(*) FILTER (WHERE t.closed_at IS NULL) AS active_tasks,
        MAX(GREATEST(t.created_at, t.closed_at)) AS last_activity_at
    FROM tasks t
    WHERE (t.source_detailed IS NULL OR t.source_detailed <> ALL($1::text[]))
      AND (cardinality($2::text[]) = 0 OR t.family_id::text = ANY($2::text[]))
    GROUP BY t.family_id
"#;

/// Secondary facts per family computed from the task table.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyActivity {
    pub active_tasks: f64,
    pub last_activity_at: Option<NaiveDateTime>,
}

impl MetricsAggregator {
    pub async fn client_health(&self, query: &DashboardQuery) -> MetricsResult<Vec<ClientHealthRow>> {
        let predicate = query.predicate();
        self.log_filters(CLIENT_HEALTH_VIEW, &predicate);

        let params = [predicate.assistants(), predicate.families(), predicate.plans()];
        let plan = QueryPlan::new(
            SourceQuery::new(CLIENT_HEALTH_VIEW, "canonical", CLIENT_HEALTH_SQL).bind_all(params.clone()),
        )
        .with_adapter(
            SourceQuery::new(CLIENT_HEALTH_VIEW, "contract_only", CLIENT_HEALTH_CONTRACT_ONLY_SQL)
                .bind_all(params),
        );
        let primary = self.run(MetricDomain::ClientHealth, plan).await?;

        let activity = if primary.iter().any(needs_activity) {
            self.family_activity(query).await?
        } else {
            HashMap::new()
        };

        let merged = merge_client_health(&primary, &activity, query.as_of);
        Ok(finish_client_health(merged, &predicate.statuses))
    }

    async fn family_activity(&self, query: &DashboardQuery) -> MetricsResult<HashMap<String, FamilyActivity>> {
        let predicate = query.predicate();
        let plan = QueryPlan::new(
            SourceQuery::new("tasks", "family_activity", FAMILY_ACTIVITY_SQL)
                .bind(text_list(&self.rules().excluded_task_sources))
                .bind(predicate.families()),
        );
        let rows = self.run(MetricDomain::ClientHealth, plan).await?;
        Ok(family_activity_from_rows(&rows))
    }
}

fn needs_activity(row: &RawRow) -> bool {
    row.optional_number("active_tasks").is_none()
        || row.optional_number("days_since_last_task").is_none()
}

pub fn family_activity_from_rows(rows: &[RawRow]) -> HashMap<String, FamilyActivity> {
    rows.iter()
        .map(|row| {
            (
                row.text("family_id"),
                FamilyActivity {
                    active_tasks: row.number("active_tasks"),
                    last_activity_at: to_timestamp(row.field("last_activity_at")),
                },
            )
        })
        .collect()
}

/// Merge primary rows with the secondary aggregate. Primary values win;
/// secondary values fill gaps; with neither, active tasks is 0 and the
/// family reads as never active.
pub fn merge_client_health(
    primary: &[RawRow],
    activity: &HashMap<String, FamilyActivity>,
    as_of: NaiveDateTime,
) -> Vec<ClientHealthRow> {
    primary
        .iter()
        .map(|row| {
            let family_id = row.text("family_id");
            let secondary = activity.get(&family_id);

            let active_tasks = row
                .optional_number("active_tasks")
                .or_else(|| secondary.map(|a| a.active_tasks))
                .unwrap_or(0.0);

            let days_since_last_task = row
                .optional_number("days_since_last_task")
                .map(|days| days.round() as i64)
                .or_else(|| {
                    secondary
                        .and_then(|a| a.last_activity_at)
                        .map(|last| (as_of - last).num_days().max(0))
                })
                .unwrap_or(NEVER_ACTIVE_SENTINEL_DAYS);

            let contract = row.optional_text("contract");
            let subscription_type = row.optional_text("subscription_type").or_else(|| contract.clone());

            ClientHealthRow {
                family_id,
                family_name: row.text("family_name"),
                assistant_id: row.text("assistant_id"),
                assistant_name: to_display_assistant_name(&row.text("assistant_name")),
                contract,
                subscription_type,
                life_transitions: row.optional_text("life_transitions"),
                life_transition_icons: row.optional_text("life_transition_icons"),
                active_tasks,
                days_since_last_task,
                health_status: HealthStatus::parse_lenient(&row.text_or("health_status", "Green")),
            }
        })
        .collect()
}

/// Post-merge status filter, then a stable sort with the least recently
/// active families first.
pub fn finish_client_health(rows: Vec<ClientHealthRow>, statuses: &[String]) -> Vec<ClientHealthRow> {
    let mut rows: Vec<ClientHealthRow> = rows
        .into_iter()
        .filter(|row| statuses.is_empty() || statuses.iter().any(|s| row.health_status.matches(s)))
        .collect();
    rows.sort_by(|a, b| b.days_since_last_task.cmp(&a.days_since_last_task));
    rows
}
