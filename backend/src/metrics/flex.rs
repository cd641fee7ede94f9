use opsdash_shared::FlexUsageRow;

use super::rules::{ClassificationRules, FLEX_CONTRACT};
use super::{text_list, MetricDomain, MetricsAggregator, MetricsResult};
use crate::normalize::RowExt;
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

const FLEX_USAGE_SQL: &str = r#"
    SELECT
        f.id::text AS family_id,
        COUNT(t.id) FILTER (
            WHERE t.closed_at IS NOT NULL
              AND t.created_at >= f.flex_start_date
              AND (t.source_detailed IS NULL OR t.source_detailed <> ALL($2::text[]))
        ) AS flex_tasks_used
    FROM families f
    LEFT JOIN tasks t ON t.family_id::text = f.id::text
    WHERE f.contract = $1
      AND f.flex_start_date IS NOT NULL
    GROUP BY f.id::text
"#;

impl MetricsAggregator {
    /// Flex-plan usage since each family's flex start date. Not filter-scoped.
    pub async fn flex_usage(&self) -> MetricsResult<Vec<FlexUsageRow>> {
        let plan = QueryPlan::new(SourceQuery::new("families", "flex_usage", FLEX_USAGE_SQL).bind_all([
            SqlParam::Text(Some(FLEX_CONTRACT.to_string())),
            text_list(&self.rules().excluded_task_sources),
        ]));
        let rows = self.run(MetricDomain::FlexUsage, plan).await?;
        Ok(rows.iter().map(|row| flex_usage_row(row, self.rules())).collect())
    }
}

pub fn flex_usage_row(row: &RawRow, rules: &ClassificationRules) -> FlexUsageRow {
    let used = row.number("flex_tasks_used");
    FlexUsageRow {
        family_id: row.text("family_id"),
        flex_tasks_used: used,
        flex_tasks_remaining: (rules.flex_allotment - used).max(0.0),
        usage_level: rules.flex_level(used),
    }
}
