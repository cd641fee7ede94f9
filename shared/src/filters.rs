//! Dashboard filter state and its query-string codec.
//!
//! The filter model is the single source of truth for every metric fetch. It
//! round-trips through a flat `key -> value` map so it can live in a URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PARAM_PERIOD: &str = "period";
pub const PARAM_FROM: &str = "from";
pub const PARAM_TO: &str = "to";
pub const PARAM_ASSISTANT: &str = "assistant";
pub const PARAM_CLIENT: &str = "client";
pub const PARAM_CONTRACT: &str = "contract";
pub const PARAM_STATUS: &str = "status";

/// Separator for list-valued parameters
pub const LIST_SEPARATOR: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    #[default]
    #[serde(rename = "last_7_days")]
    Last7Days,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    #[serde(rename = "last_30_days")]
    Last30Days,
    #[serde(rename = "last_90_days")]
    Last90Days,
    Custom,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 8] = [
        Self::Last7Days,
        Self::ThisWeek,
        Self::LastWeek,
        Self::ThisMonth,
        Self::LastMonth,
        Self::Last30Days,
        Self::Last90Days,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last7Days => "last_7_days",
            Self::ThisWeek => "this_week",
            Self::LastWeek => "last_week",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::Last30Days => "last_30_days",
            Self::Last90Days => "last_90_days",
            Self::Custom => "custom",
        }
    }

    /// Parse a wire value. Unknown values yield `None`; callers default them.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value.trim())
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical dashboard filter.
///
/// Selection lists keep every value the caller supplied, in order. Server-side
/// predicates match any of the selected values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub period: TimePeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub assistant: Vec<String>,
    #[serde(default)]
    pub client: Vec<String>,
    #[serde(default)]
    pub contract: Vec<String>,
    #[serde(default)]
    pub status: Vec<String>,
}

/// Partial update applied by [`FilterState::apply`]. `None` leaves a key alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub period: Option<TimePeriod>,
    pub from: Option<Option<String>>,
    pub to: Option<Option<String>>,
    pub assistant: Option<Vec<String>>,
    pub client: Option<Vec<String>>,
    pub contract: Option<Vec<String>>,
    pub status: Option<Vec<String>>,
}

impl FilterState {
    pub fn new(period: TimePeriod) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn custom(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            period: TimePeriod::Custom,
            from: Some(from.into()),
            to: Some(to.into()),
            ..Default::default()
        }
    }

    /// The reset state used by "clear filters".
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Merge a patch into a new state; the receiver is left untouched.
    pub fn apply(&self, patch: FilterPatch) -> Self {
        let mut next = self.clone();
        if let Some(period) = patch.period {
            next.period = period;
        }
        if let Some(from) = patch.from {
            next.from = from;
        }
        if let Some(to) = patch.to {
            next.to = to;
        }
        if let Some(assistant) = patch.assistant {
            next.assistant = assistant;
        }
        if let Some(client) = patch.client {
            next.client = client;
        }
        if let Some(contract) = patch.contract {
            next.contract = contract;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next
    }

    pub fn with_assistant(mut self, id: impl Into<String>) -> Self {
        self.assistant = vec![id.into()];
        self
    }

    pub fn with_client(mut self, id: impl Into<String>) -> Self {
        self.client = vec![id.into()];
        self
    }

    pub fn with_contract(mut self, plan: impl Into<String>) -> Self {
        self.contract = vec![plan.into()];
        self
    }

    pub fn with_status<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.status = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Decode from a flat parameter map. Missing or unknown keys take defaults.
    pub fn decode<K, V>(params: &BTreeMap<K, V>) -> Self
    where
        K: AsRef<str> + Ord,
        V: AsRef<str>,
    {
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k.as_ref() == key)
                .map(|(_, v)| v.as_ref())
        };

        Self {
            period: get(PARAM_PERIOD)
                .and_then(TimePeriod::parse)
                .unwrap_or_default(),
            from: get(PARAM_FROM).and_then(non_empty),
            to: get(PARAM_TO).and_then(non_empty),
            assistant: parse_list(get(PARAM_ASSISTANT)),
            client: parse_list(get(PARAM_CLIENT)),
            contract: parse_list(get(PARAM_CONTRACT)),
            status: parse_list(get(PARAM_STATUS)),
        }
    }

    /// Encode to a flat parameter map. `period` is always present; empty
    /// values are omitted to keep URLs short.
    pub fn encode(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert(PARAM_PERIOD.to_string(), self.period.as_str().to_string());

        if let Some(from) = self.from.as_deref().filter(|v| !v.is_empty()) {
            params.insert(PARAM_FROM.to_string(), from.to_string());
        }
        if let Some(to) = self.to.as_deref().filter(|v| !v.is_empty()) {
            params.insert(PARAM_TO.to_string(), to.to_string());
        }

        let lists = [
            (PARAM_ASSISTANT, &self.assistant),
            (PARAM_CLIENT, &self.client),
            (PARAM_CONTRACT, &self.contract),
            (PARAM_STATUS, &self.status),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                params.insert(key.to_string(), join_list(values));
            }
        }

        params
    }

    /// Parse a raw URL query string (with or without the leading `?`).
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let params: BTreeMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self::decode(&params)
    }

    /// Render as a URL query string in a stable key order.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.encode())
            .finish()
    }

    pub fn has_custom_bounds(&self) -> bool {
        self.period == TimePeriod::Custom && self.from.is_some() && self.to.is_some()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(LIST_SEPARATOR)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn join_list(values: &[String]) -> String {
    values.join(&LIST_SEPARATOR.to_string())
}
