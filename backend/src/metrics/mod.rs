//! Per-domain fetch, merge and classify pipelines.
//!
//! Each domain lives in its own module as an `impl MetricsAggregator` block
//! plus the pure row-mapping functions it uses, so the mapping can be tested
//! without a data source.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use opsdash_shared::{resolve, DateRange, FilterState};
use serde::{Deserialize, Serialize};

use crate::source::{DataSource, QueryPlan, RawRow, SourceError, SourceQuery, SqlParam};

pub mod capacity;
pub mod client_health;
pub mod flex;
pub mod lookups;
pub mod performance;
pub mod rules;
pub mod stuck_tasks;
pub mod tasks;
pub mod time_entries;

pub use performance::PerformanceStrategy;
pub use rules::ClassificationRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDomain {
    Dashboard,
    ClientHealth,
    FohPerformance,
    FohCapacity,
    StuckTasks,
    TogglDetail,
    ClientTimeTotals,
    ClientTimeBreakdown,
    TasksDetail,
    RecentTasks,
    FlexUsage,
    DashboardAlerts,
    Assistants,
    Families,
}

impl MetricDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::ClientHealth => "client_health",
            Self::FohPerformance => "foh_performance",
            Self::FohCapacity => "foh_capacity",
            Self::StuckTasks => "stuck_tasks",
            Self::TogglDetail => "toggl_detail",
            Self::ClientTimeTotals => "client_time_totals",
            Self::ClientTimeBreakdown => "client_time_breakdown",
            Self::TasksDetail => "tasks_detail",
            Self::RecentTasks => "recent_tasks",
            Self::FlexUsage => "flex_usage",
            Self::DashboardAlerts => "dashboard_alerts",
            Self::Assistants => "assistants",
            Self::Families => "families",
        }
    }
}

impl fmt::Display for MetricDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to fetch {domain}: {source}")]
    Fetch {
        domain: MetricDomain,
        #[source]
        source: SourceError,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// One fetch cycle's inputs: the filters, their resolved range and the
/// instant used for elapsed-day arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardQuery {
    pub filters: FilterState,
    pub range: DateRange,
    pub as_of: NaiveDateTime,
}

impl DashboardQuery {
    pub fn new(filters: FilterState, as_of: NaiveDateTime) -> Self {
        let range = resolve(&filters, as_of.date());
        Self {
            filters,
            range,
            as_of,
        }
    }

    pub fn now(filters: FilterState) -> Self {
        Self::new(filters, Local::now().naive_local())
    }

    /// Deterministic identity of a domain request. Callers compare it with
    /// the key of their latest request and drop stale responses.
    pub fn query_key(&self, domain: MetricDomain) -> String {
        format!("{}?{}#{}", domain, self.filters.to_query_string(), self.range)
    }

    pub fn predicate(&self) -> FilterPredicate {
        FilterPredicate::from_filters(&self.filters)
    }

    /// `(start, end)` timestamp strings for the resolved range.
    pub fn timestamp_params(&self) -> (SqlParam, SqlParam) {
        let (start, end) = self.range.timestamp_bounds();
        (SqlParam::Text(Some(start)), SqlParam::Text(Some(end)))
    }

    pub fn date_params(&self) -> (SqlParam, SqlParam) {
        (SqlParam::Date(self.range.from), SqlParam::Date(self.range.to))
    }
}

/// Server-side predicate. An empty list means "no restriction"; SQL tests it
/// with `cardinality($n::text[]) = 0 OR col = ANY($n::text[])`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    pub assistant_ids: Vec<String>,
    pub family_ids: Vec<String>,
    pub plan_types: Vec<String>,
    pub statuses: Vec<String>,
}

impl FilterPredicate {
    pub fn from_filters(filters: &FilterState) -> Self {
        Self {
            assistant_ids: filters.assistant.clone(),
            family_ids: filters.client.clone(),
            plan_types: filters.contract.clone(),
            statuses: filters.status.clone(),
        }
    }

    pub fn assistants(&self) -> SqlParam {
        SqlParam::TextList(self.assistant_ids.clone())
    }

    pub fn families(&self) -> SqlParam {
        SqlParam::TextList(self.family_ids.clone())
    }

    pub fn plans(&self) -> SqlParam {
        SqlParam::TextList(self.plan_types.clone())
    }
}

#[derive(Clone)]
pub struct MetricsAggregator {
    source: Arc<dyn DataSource>,
    rules: Arc<ClassificationRules>,
    debug_filters: bool,
}

impl MetricsAggregator {
    pub fn new(source: Arc<dyn DataSource>, rules: ClassificationRules) -> Self {
        Self {
            source,
            rules: Arc::new(rules),
            debug_filters: false,
        }
    }

    pub fn with_debug_filters(mut self, enabled: bool) -> Self {
        self.debug_filters = enabled;
        self
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Round-trip to the source, for liveness checks.
    pub async fn ping(&self) -> Result<(), SourceError> {
        let query = SourceQuery::new("source", "ping", "SELECT 1 AS ok");
        self.source.fetch_rows(&query).await.map(|_| ())
    }

    async fn run(&self, domain: MetricDomain, plan: QueryPlan) -> MetricsResult<Vec<RawRow>> {
        plan.execute(self.source.as_ref())
            .await
            .map_err(|source| MetricsError::Fetch { domain, source })
    }

    fn log_filters(&self, view: &str, applied: impl fmt::Debug) {
        if self.debug_filters {
            tracing::info!("[filters:applied][{}] {:?}", view, applied);
        }
    }
}

/// Text-list parameter from a rules list.
pub(crate) fn text_list(values: &[String]) -> SqlParam {
    SqlParam::TextList(values.to_vec())
}
