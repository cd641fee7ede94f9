//! Classification thresholds and exclusion lists.
//!
//! All literals the aggregator depends on live here so the rules can be tuned
//! from configuration and exercised in isolation.

use std::sync::OnceLock;

use opsdash_shared::{LoadLevel, PerformanceStatus};
use regex::Regex;

/// Task sources that are not client work.
pub const EXCLUDED_TASK_SOURCES: &[&str] = &["Engagement", "Marketing", "Initiative"];

/// Sources left out of completion counts. Initiatives still count as done work.
pub const EXCLUDED_COMPLETION_SOURCES: &[&str] = &["Engagement", "Marketing"];

/// House accounts that never count towards assistant performance.
pub const INTERNAL_FAMILY_IDS: &[&str] = &["recRpXW7Q0aAMnbht", "recWsSUu7Z7RfCLo9"];

pub const PERFORMANCE_AMBER_MINUTES: f64 = 30.0;
pub const PERFORMANCE_RED_MINUTES: f64 = 45.0;

/// `days_since_last_task` for a family with no recorded activity at all.
pub const NEVER_ACTIVE_SENTINEL_DAYS: i64 = 9999;

pub const FOH_ASSISTANT_TYPE: &str = "FOH";
pub const ACTIVE_FAMILY_STATUS: &str = "🟢 Active";

pub const FLEX_CONTRACT: &str = "BlckBx Flex";
pub const FLEX_ALLOTMENT: f64 = 20.0;
pub const FLEX_AMBER_AT: f64 = 15.0;
pub const FLEX_RED_AT: f64 = 18.0;

pub const RECENT_TASKS_LIMIT: i64 = 5;

/// Task-status selector meaning "no task-status filter".
pub const TASK_STATUS_ALL: &str = "all";

/// Leading ordinal on workflow statuses, e.g. `"3. "` or `"2.1. "`.
pub const STATUS_PREFIX_PATTERN: &str = r"^\d+(\.\d+)?\.\s*";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRules {
    pub performance_amber_minutes: f64,
    pub performance_red_minutes: f64,
    pub excluded_task_sources: Vec<String>,
    pub excluded_completion_sources: Vec<String>,
    pub internal_family_ids: Vec<String>,
    pub flex_allotment: f64,
    pub flex_amber_at: f64,
    pub flex_red_at: f64,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            performance_amber_minutes: PERFORMANCE_AMBER_MINUTES,
            performance_red_minutes: PERFORMANCE_RED_MINUTES,
            excluded_task_sources: to_owned_list(EXCLUDED_TASK_SOURCES),
            excluded_completion_sources: to_owned_list(EXCLUDED_COMPLETION_SOURCES),
            internal_family_ids: to_owned_list(INTERNAL_FAMILY_IDS),
            flex_allotment: FLEX_ALLOTMENT,
            flex_amber_at: FLEX_AMBER_AT,
            flex_red_at: FLEX_RED_AT,
        }
    }
}

impl ClassificationRules {
    /// Threshold strategy: `0` means no data and stays Green; the amber band
    /// is inclusive at both ends.
    pub fn performance_status(&self, avg_mins_per_task: f64) -> PerformanceStatus {
        if avg_mins_per_task == 0.0 || avg_mins_per_task < self.performance_amber_minutes {
            PerformanceStatus::Green
        } else if avg_mins_per_task <= self.performance_red_minutes {
            PerformanceStatus::Amber
        } else {
            PerformanceStatus::Red
        }
    }

    pub fn flex_level(&self, tasks_used: f64) -> LoadLevel {
        if tasks_used >= self.flex_red_at {
            LoadLevel::Red
        } else if tasks_used >= self.flex_amber_at {
            LoadLevel::Amber
        } else {
            LoadLevel::Green
        }
    }
}

/// Client-health strategy: worst client wins.
pub fn performance_status_from_clients(red_clients: u32, amber_clients: u32) -> PerformanceStatus {
    if red_clients > 0 {
        PerformanceStatus::Red
    } else if amber_clients > 0 {
        PerformanceStatus::Amber
    } else {
        PerformanceStatus::Green
    }
}

fn status_prefix() -> Option<&'static Regex> {
    static PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    PREFIX
        .get_or_init(|| Regex::new(STATUS_PREFIX_PATTERN).ok())
        .as_ref()
}

/// `"3. Waiting on client"` -> `"Waiting on client"`.
pub fn strip_status_prefix(status: &str) -> String {
    match status_prefix() {
        Some(re) => re.replace(status, "").trim().to_string(),
        None => status.trim().to_string(),
    }
}

/// Task-status selector to compare against, or `None` for "all".
pub fn task_status_selector(selected: Option<&str>) -> Option<String> {
    selected
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case(TASK_STATUS_ALL))
        .map(strip_status_prefix)
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
