use opsdash_shared::{StuckStatus, StuckTaskRow};

use super::rules::{task_status_selector, STATUS_PREFIX_PATTERN};
use super::{DashboardQuery, MetricDomain, MetricsAggregator, MetricsResult};
use crate::normalize::{to_display_assistant_name, to_number, to_string_value, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

pub const STUCK_TASKS_VIEW: &str = "v_stuck_tasks";

// The view carries names only; ids are looked up so rows link back to the
// assistant and family filters.
fn stuck_tasks_sql(order_column: &str) -> String {
    format!(
        r#"
    SELECT
        st.*,
        (SELECT a.id::text FROM assistants a WHERE a.name = st.assistant_name LIMIT 1) AS assistant_id,
        (SELECT ch.family_id::text FROM v_client_health ch WHERE ch.family_name = st.family_name LIMIT 1) AS family_id
    FROM v_stuck_tasks st
    WHERE (
        cardinality($1::text[]) = 0
        OR EXISTS (
            SELECT 1 FROM assistants a
            WHERE a.id::text = ANY($1::text[]) AND a.name = st.assistant_name
        )
    )
      AND (
        cardinality($2::text[]) = 0
        OR EXISTS (
            SELECT 1 FROM v_client_health ch
            WHERE ch.family_id::text = ANY($2::text[]) AND ch.family_name = st.family_name
        )
    )
      AND ($3::text IS NULL OR TRIM(REGEXP_REPLACE(st.task_status, $4, '')) = $3::text)
    ORDER BY st.{order_column} DESC
"#
    )
}

impl MetricsAggregator {
    /// `task_status` of `None` or `"all"` applies no task-status filter.
    pub async fn stuck_tasks(
        &self,
        query: &DashboardQuery,
        task_status: Option<&str>,
    ) -> MetricsResult<Vec<StuckTaskRow>> {
        let predicate = query.predicate();
        let selected_status = task_status_selector(task_status);
        self.log_filters(
            STUCK_TASKS_VIEW,
            (&predicate.assistant_ids, &predicate.family_ids, &selected_status),
        );

        let params = [
            predicate.assistants(),
            predicate.families(),
            SqlParam::Text(selected_status),
            SqlParam::Text(Some(STATUS_PREFIX_PATTERN.to_string())),
        ];
        let plan = QueryPlan::new(
            SourceQuery::new(STUCK_TASKS_VIEW, "canonical", stuck_tasks_sql("days_since_update"))
                .bind_all(params.clone()),
        )
        .with_adapter(
            SourceQuery::new(STUCK_TASKS_VIEW, "days_open", stuck_tasks_sql("days_open")).bind_all(params),
        );
        let rows = self.run(MetricDomain::StuckTasks, plan).await?;
        Ok(rows.iter().map(stuck_task_row).collect())
    }
}

pub fn stuck_task_row(row: &RawRow) -> StuckTaskRow {
    StuckTaskRow {
        task_id: row.text("task_id"),
        task_title: row.text("task_title"),
        family_id: row.text("family_id"),
        family_name: row.text("family_name"),
        assistant_id: row.text("assistant_id"),
        assistant_name: to_display_assistant_name(&row.text("assistant_name")),
        days_since_update: to_number(row.first_present(&["days_since_update", "days_open"]), 0.0),
        task_state: row.text("task_state"),
        task_status: to_string_value(row.first_present(&["task_status", "task_state"]), ""),
        category: row.optional_text("category"),
        stuck_status: StuckStatus::parse_lenient(&row.text_or("stuck_status", "Stuck")),
    }
}
