use opsdash_shared::{AssistantRow, DashboardAlertsRow, FamilyRow};

use super::rules::FOH_ASSISTANT_TYPE;
use super::{MetricDomain, MetricsAggregator, MetricsResult};
use crate::normalize::{to_display_assistant_name, to_string_value, RowExt};
use crate::source::{QueryPlan, RawRow, SourceQuery, SqlParam};

pub const DASHBOARD_ALERTS_VIEW: &str = "v_dashboard_alerts";

const ASSISTANTS_SQL: &str = "SELECT * FROM assistants WHERE type = $1 ORDER BY name ASC";

const FAMILIES_SQL: &str = r#"
    SELECT DISTINCT family_id, family_name
    FROM v_client_health
    ORDER BY family_name ASC
"#;

const DASHBOARD_ALERTS_SQL: &str = "SELECT * FROM v_dashboard_alerts";

impl MetricsAggregator {
    pub async fn assistants(&self) -> MetricsResult<Vec<AssistantRow>> {
        let plan = QueryPlan::new(
            SourceQuery::new("assistants", "canonical", ASSISTANTS_SQL)
                .bind(SqlParam::Text(Some(FOH_ASSISTANT_TYPE.to_string()))),
        );
        let rows = self.run(MetricDomain::Assistants, plan).await?;
        Ok(rows
            .iter()
            .map(|row| AssistantRow {
                id: row.text("id"),
                name: to_display_assistant_name(&row.text("name")),
                assistant_type: row.text("type"),
            })
            .collect())
    }

    pub async fn families(&self) -> MetricsResult<Vec<FamilyRow>> {
        let plan = QueryPlan::new(SourceQuery::new("v_client_health", "families", FAMILIES_SQL));
        let rows = self.run(MetricDomain::Families, plan).await?;
        Ok(families_from_rows(&rows))
    }

    /// Pre-computed alert counts published by the database.
    pub async fn dashboard_alerts(&self) -> MetricsResult<Vec<DashboardAlertsRow>> {
        let plan = QueryPlan::new(SourceQuery::new(DASHBOARD_ALERTS_VIEW, "canonical", DASHBOARD_ALERTS_SQL));
        let rows = self.run(MetricDomain::DashboardAlerts, plan).await?;
        Ok(rows.iter().map(dashboard_alerts_row).collect())
    }
}

pub fn families_from_rows(rows: &[RawRow]) -> Vec<FamilyRow> {
    let mut families: Vec<FamilyRow> = rows
        .iter()
        .map(|row| FamilyRow {
            id: to_string_value(row.first_present(&["family_id", "id"]), ""),
            family_name: row.text("family_name"),
            contract: None,
        })
        .collect();
    families.sort_by_key(|f| f.family_name.to_lowercase());
    families
}

pub fn dashboard_alerts_row(row: &RawRow) -> DashboardAlertsRow {
    DashboardAlertsRow {
        alert_type: to_string_value(row.first_present(&["alert_type", "category"]), ""),
        red_count: row.number("red_count"),
        amber_count: row.number("amber_count"),
    }
}
