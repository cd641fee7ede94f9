//! Red/amber roll-ups of classified rows for the top-level alert cards.

use std::collections::BTreeMap;

use opsdash_shared::{
    ClientHealthRow, DashboardAlertsRow, FlexUsageRow, FohCapacityRow, FohPerformanceRow,
    HealthStatus, LoadLevel, PerformanceStatus, StuckStatus, StuckTaskRow,
};
use serde::{Deserialize, Serialize};

pub const CLIENT_HEALTH_ALIASES: &[&str] = &["client_health", "clients", "client health"];
pub const PERFORMANCE_ALIASES: &[&str] = &["performance", "foh_performance", "assistant_performance"];
pub const STUCK_TASKS_ALIASES: &[&str] = &["stuck_tasks", "stuck", "stuck tasks"];
pub const CAPACITY_ALIASES: &[&str] = &["capacity", "foh_capacity", "foh capacity"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub red_count: u32,
    pub amber_count: u32,
}

impl AlertCounts {
    pub fn new(red_count: u32, amber_count: u32) -> Self {
        Self {
            red_count,
            amber_count,
        }
    }

    fn tally<T>(rows: &[T], is_red: impl Fn(&T) -> bool, is_amber: impl Fn(&T) -> bool) -> Self {
        let red = rows.iter().filter(|r| is_red(r)).count();
        let amber = rows.iter().filter(|r| is_amber(r)).count();
        Self::new(red as u32, amber as u32)
    }
}

/// Purple (renewal due) counts as amber.
pub fn summarize_client_health(rows: &[ClientHealthRow]) -> AlertCounts {
    AlertCounts::tally(
        rows,
        |r| r.health_status == HealthStatus::Red,
        |r| matches!(r.health_status, HealthStatus::Amber | HealthStatus::Purple),
    )
}

pub fn summarize_performance(rows: &[FohPerformanceRow]) -> AlertCounts {
    AlertCounts::tally(
        rows,
        |r| r.performance_status == PerformanceStatus::Red,
        |r| r.performance_status == PerformanceStatus::Amber,
    )
}

pub fn summarize_stuck_tasks(rows: &[StuckTaskRow]) -> AlertCounts {
    AlertCounts::tally(
        rows,
        |r| r.stuck_status == StuckStatus::Stuck,
        |r| matches!(r.stuck_status, StuckStatus::Aging | StuckStatus::Delayed),
    )
}

/// Uses the bar colour, not the source's capacity label.
pub fn summarize_capacity(rows: &[FohCapacityRow]) -> AlertCounts {
    AlertCounts::tally(
        rows,
        |r| r.bar_level() == LoadLevel::Red,
        |r| r.bar_level() == LoadLevel::Amber,
    )
}

pub fn summarize_flex_usage(rows: &[FlexUsageRow]) -> AlertCounts {
    AlertCounts::tally(
        rows,
        |r| r.usage_level == LoadLevel::Red,
        |r| r.usage_level == LoadLevel::Amber,
    )
}

/// `"FOH Capacity"` -> `"foh_capacity"`.
pub fn normalize_alert_type(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn count_from_view(value: f64) -> u32 {
    if value.is_finite() {
        value.max(0.0).round() as u32
    } else {
        0
    }
}

/// Alert counts keyed by normalised alert type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertBoard {
    counts: BTreeMap<String, AlertCounts>,
}

impl AlertBoard {
    /// Seed from the database's alert view. Later rows win on duplicate keys.
    pub fn from_view_rows(rows: &[DashboardAlertsRow]) -> Self {
        let counts = rows
            .iter()
            .map(|row| {
                (
                    normalize_alert_type(&row.alert_type),
                    AlertCounts::new(count_from_view(row.red_count), count_from_view(row.amber_count)),
                )
            })
            .collect();
        Self { counts }
    }

    /// Computed counts replace whatever the view reported for `key`.
    pub fn set_computed(&mut self, key: &str, counts: AlertCounts) {
        self.counts.insert(normalize_alert_type(key), counts);
    }

    /// Only used when no alias of `aliases` is present yet.
    pub fn set_fallback(&mut self, aliases: &[&str], counts: AlertCounts) {
        if self.find(aliases).is_none() {
            if let Some(primary) = aliases.first() {
                self.counts.insert(normalize_alert_type(primary), counts);
            }
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<AlertCounts> {
        aliases
            .iter()
            .find_map(|alias| self.counts.get(&normalize_alert_type(alias)).copied())
    }

    /// Counts under the first alias present, or zeroes.
    pub fn lookup(&self, aliases: &[&str]) -> AlertCounts {
        self.find(aliases).unwrap_or_default()
    }
}
