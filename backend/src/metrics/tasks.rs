use opsdash_shared::{RecentClientTaskRow, TaskDetailRow};

use super::rules::RECENT_TASKS_LIMIT;
use super::{text_list, DashboardQuery, MetricDomain, MetricsAggregator, MetricsError, MetricsResult};
use crate::normalize::{to_date_string, to_display_assistant_name, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

const TASKS_DETAIL_SQL: &str = r#"
    SELECT
        t.id::text AS task_id,
        t.family_id::text AS family_id,
        COALESCE(ch.family_name, '') AS family_name,
        t.assistant_id::text AS assistant_id,
        COALESCE(a.name, '') AS assistant_name,
        t.title AS task_title,
        t.category,
        t.closed_at::date AS closed_date,
        t.created_at
    FROM tasks t
    LEFT JOIN (
        SELECT DISTINCT family_id::text AS family_id, family_name
        FROM v_client_health
    ) ch ON ch.family_id = t.family_id::text
    LEFT JOIN assistants a ON a.id::text = t.assistant_id::text
    WHERE (cardinality($1::text[]) = 0 OR t.assistant_id::text = ANY($1::text[]))
      AND (cardinality($2::text[]) = 0 OR t.family_id::text = ANY($2::text[]))
      AND t.closed_at IS NOT NULL
      AND t.closed_at::date >= $3
      AND t.closed_at::date <= $4
      AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($5::text[]))
    ORDER BY t.closed_at DESC
"#;

const RECENT_TASKS_SQL: &str = r#"
    SELECT title, category, task_state, created_at, closed_at
    FROM tasks
    WHERE family_id::text = $1
      AND (source_detailed IS NULL OR source_detailed <> ALL($2::text[]))
    ORDER BY created_at DESC
    LIMIT $3::bigint
"#;

impl MetricsAggregator {
    /// Tasks completed inside the resolved range.
    pub async fn tasks_detail(&self, query: &DashboardQuery) -> MetricsResult<Vec<TaskDetailRow>> {
        let predicate = query.predicate();
        let (from, to) = query.date_params();
        self.log_filters(
            "v_tasks_detail",
            (&predicate.assistant_ids, &predicate.family_ids, query.range),
        );

        let plan = QueryPlan::new(SourceQuery::new("tasks", "canonical", TASKS_DETAIL_SQL).bind_all([
            predicate.assistants(),
            predicate.families(),
            from,
            to,
            text_list(&self.rules().excluded_completion_sources),
        ]));
        let rows = self.run(MetricDomain::TasksDetail, plan).await?;
        Ok(rows.iter().map(task_detail_row).collect())
    }

    pub async fn recent_client_tasks(&self, family_id: &str) -> MetricsResult<Vec<RecentClientTaskRow>> {
        let family_id = family_id.trim();
        if family_id.is_empty() {
            return Err(MetricsError::InvalidRequest(
                "recent tasks require a family id".to_string(),
            ));
        }

        let plan = QueryPlan::new(SourceQuery::new("tasks", "recent", RECENT_TASKS_SQL).bind_all([
            SqlParam::Text(Some(family_id.to_string())),
            text_list(&self.rules().excluded_completion_sources),
            SqlParam::Text(Some(RECENT_TASKS_LIMIT.to_string())),
        ]));
        let rows = self.run(MetricDomain::RecentTasks, plan).await?;
        Ok(rows
            .iter()
            .map(|row| RecentClientTaskRow {
                title: row.text("title"),
                category: row.optional_text("category"),
                task_state: row.text("task_state"),
                created_at: row.text("created_at"),
                closed_at: row.optional_text("closed_at"),
            })
            .collect())
    }
}

pub fn task_detail_row(row: &RawRow) -> TaskDetailRow {
    TaskDetailRow {
        task_id: row.text("task_id"),
        family_id: row.text("family_id"),
        family_name: row.text("family_name"),
        assistant_id: row.text("assistant_id"),
        assistant_name: to_display_assistant_name(&row.text("assistant_name")),
        task_title: row.text("task_title"),
        category: row.optional_text("category"),
        closed_date: to_date_string(row.field("closed_date")),
        created_at: row.text("created_at"),
    }
}
