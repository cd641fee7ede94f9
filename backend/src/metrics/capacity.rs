use opsdash_shared::FohCapacityRow;

use super::{DashboardQuery, MetricDomain, MetricsAggregator, MetricsResult};
use crate::normalize::{to_display_assistant_name, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery};

pub const CAPACITY_VIEW: &str = "v_foh_capacity";

const CAPACITY_SQL: &str = r#"
    SELECT *
    FROM v_foh_capacity
    WHERE (cardinality($1::text[]) = 0 OR assistant_id::text = ANY($1::text[]))
    ORDER BY available_slots ASC
"#;

impl MetricsAggregator {
    /// Capacity only honours the assistant filter.
    pub async fn foh_capacity(&self, query: &DashboardQuery) -> MetricsResult<Vec<FohCapacityRow>> {
        let predicate = query.predicate();
        self.log_filters(CAPACITY_VIEW, &predicate.assistant_ids);

        let plan = QueryPlan::new(
            SourceQuery::new(CAPACITY_VIEW, "canonical", CAPACITY_SQL).bind(predicate.assistants()),
        );
        let rows = self.run(MetricDomain::FohCapacity, plan).await?;
        Ok(rows.iter().map(capacity_row).collect())
    }
}

pub fn capacity_row(row: &RawRow) -> FohCapacityRow {
    FohCapacityRow {
        assistant_id: row.text("assistant_id"),
        assistant_name: to_display_assistant_name(&row.text("assistant_name")),
        current_clients: row.number("current_clients"),
        base_capacity: row.number("base_capacity"),
        max_capacity: row.number("max_capacity"),
        available_slots: row.number("available_slots"),
        capacity_status: row.text("capacity_status"),
        can_take_holiday_cover: row.flag("can_take_holiday_cover"),
    }
}
