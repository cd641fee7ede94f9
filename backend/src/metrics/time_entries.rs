//! Time-tracking domains over `v_toggl_detail`. Older deployments call the
//! duration column `minutes`; each plan carries an adapter for that.

use opsdash_shared::{ClientTimeBreakdownRow, ClientTimeTotalRow, TogglDetailRow};

use super::{text_list, DashboardQuery, MetricDomain, MetricsAggregator, MetricsError, MetricsResult};
use crate::normalize::{to_date_string, to_display_assistant_name, to_number, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

pub const TOGGL_DETAIL_VIEW: &str = "v_toggl_detail";

const OPERATIONAL_TASK_CLAUSE: &str = r#"
      AND EXISTS (
          SELECT 1 FROM tasks t
          WHERE t.id::text = task_id::text
            AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($5::text[]))
      )"#;

fn toggl_detail_sql(operational_only: bool) -> String {
    format!(
        r#"
    SELECT *
    FROM v_toggl_detail
    WHERE (cardinality($1::text[]) = 0 OR assistant_id::text = ANY($1::text[]))
      AND (cardinality($2::text[]) = 0 OR family_id::text = ANY($2::text[]))
      AND entry_date::date >= $3
      AND entry_date::date <= $4{}
    ORDER BY entry_date DESC
"#,
        if operational_only { OPERATIONAL_TASK_CLAUSE } else { "" }
    )
}

fn time_totals_sql(minutes_column: &str) -> String {
    format!(
        r#"
    SELECT family_id::text AS family_id, family_name, SUM({minutes_column}) AS total_minutes
    FROM v_toggl_detail
    WHERE (cardinality($1::text[]) = 0 OR assistant_id::text = ANY($1::text[]))
      AND (cardinality($2::text[]) = 0 OR family_id::text = ANY($2::text[]))
      AND entry_date::date >= $3
      AND entry_date::date <= $4
    GROUP BY family_id, family_name
    ORDER BY total_minutes DESC
"#
    )
}

fn time_breakdown_sql(minutes_column: &str) -> String {
    format!(
        r#"
    SELECT family_id::text AS family_id, category, SUM({minutes_column}) AS minutes
    FROM v_toggl_detail
    WHERE family_id::text = $1
      AND entry_date::date >= $2
      AND entry_date::date <= $3
      AND EXISTS (
          SELECT 1 FROM tasks t
          WHERE t.id::text = task_id::text
            AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($4::text[]))
      )
    GROUP BY family_id, category
    ORDER BY minutes DESC
"#
    )
}

impl MetricsAggregator {
    pub async fn toggl_detail(&self, query: &DashboardQuery) -> MetricsResult<Vec<TogglDetailRow>> {
        let predicate = query.predicate();
        let (from, to) = query.date_params();
        self.log_filters(
            TOGGL_DETAIL_VIEW,
            (&predicate.assistant_ids, &predicate.family_ids, query.range),
        );

        let plan = QueryPlan::new(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "canonical", toggl_detail_sql(true)).bind_all([
                predicate.assistants(),
                predicate.families(),
                from.clone(),
                to.clone(),
                text_list(&self.rules().excluded_task_sources),
            ]),
        )
        // Without a usable tasks.source_detailed the exclusion cannot be expressed.
        .with_adapter(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "all_sources", toggl_detail_sql(false)).bind_all([
                predicate.assistants(),
                predicate.families(),
                from,
                to,
            ]),
        );
        let rows = self.run(MetricDomain::TogglDetail, plan).await?;
        Ok(rows.iter().map(toggl_detail_row).collect())
    }

    pub async fn client_time_totals(&self, query: &DashboardQuery) -> MetricsResult<Vec<ClientTimeTotalRow>> {
        let predicate = query.predicate();
        let (from, to) = query.date_params();
        self.log_filters(
            "v_client_time_breakdown_totals",
            (&predicate.assistant_ids, &predicate.family_ids, query.range),
        );

        let params = [predicate.assistants(), predicate.families(), from, to];
        let plan = QueryPlan::new(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "canonical", time_totals_sql("duration_minutes"))
                .bind_all(params.clone()),
        )
        .with_adapter(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "minutes_column", time_totals_sql("minutes")).bind_all(params),
        );
        let rows = self.run(MetricDomain::ClientTimeTotals, plan).await?;
        Ok(rows
            .iter()
            .map(|row| ClientTimeTotalRow {
                family_id: row.text("family_id"),
                family_name: row.text("family_name"),
                total_minutes: row.number("total_minutes"),
            })
            .collect())
    }

    /// Minutes per category for one family. The family id is required.
    pub async fn client_time_breakdown(
        &self,
        query: &DashboardQuery,
        family_id: &str,
    ) -> MetricsResult<Vec<ClientTimeBreakdownRow>> {
        let family_id = family_id.trim();
        if family_id.is_empty() {
            return Err(MetricsError::InvalidRequest(
                "client time breakdown requires a family id".to_string(),
            ));
        }
        let (from, to) = query.date_params();
        self.log_filters("v_client_time_breakdown", (family_id, query.range));

        let params = [
            SqlParam::Text(Some(family_id.to_string())),
            from,
            to,
            text_list(&self.rules().excluded_task_sources),
        ];
        let plan = QueryPlan::new(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "canonical", time_breakdown_sql("duration_minutes"))
                .bind_all(params.clone()),
        )
        .with_adapter(
            SourceQuery::new(TOGGL_DETAIL_VIEW, "minutes_column", time_breakdown_sql("minutes"))
                .bind_all(params),
        );
        let rows = self.run(MetricDomain::ClientTimeBreakdown, plan).await?;
        Ok(rows
            .iter()
            .map(|row| ClientTimeBreakdownRow {
                family_id: row.text("family_id"),
                category: row.text("category"),
                minutes: row.number("minutes"),
            })
            .collect())
    }
}

pub fn toggl_detail_row(row: &RawRow) -> TogglDetailRow {
    TogglDetailRow {
        entry_id: row.text("entry_id"),
        family_id: row.text("family_id"),
        family_name: row.text("family_name"),
        assistant_id: row.text("assistant_id"),
        assistant_name: to_display_assistant_name(&row.text("assistant_name")),
        category: row.optional_text("category"),
        minutes: to_number(row.first_present(&["duration_minutes", "minutes"]), 0.0),
        entry_date: to_date_string(row.field("entry_date")).unwrap_or_default(),
    }
}
