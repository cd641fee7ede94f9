//! Normalisation boundary between loosely-typed source rows and the typed
//! metric rows.
//!
//! Nothing in here fails. Malformed values degrade to the caller's fallback so
//! one bad record never aborts a whole result set.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::source::RawRow;

/// Assistant names that are stored under an old alias, keyed lower-case.
const ASSISTANT_DISPLAY_NAMES: &[(&str, &str)] = &[("lily martin", "Lily Prados")];

static NULL: JsonValue = JsonValue::Null;

/// Numeric coercion. Null, blank, non-numeric and non-finite values yield
/// `fallback`.
pub fn to_number(value: &JsonValue, fallback: f64) -> f64 {
    to_optional_number(value).unwrap_or(fallback)
}

/// Like [`to_number`] but keeps "absent" distinguishable from zero.
pub fn to_optional_number(value: &JsonValue) -> Option<f64> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Null becomes `fallback`; everything else is stringified.
pub fn to_string_value(value: &JsonValue, fallback: &str) -> String {
    match value {
        JsonValue::Null => fallback.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn to_optional_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        other => Some(to_string_value(other, "")),
    }
}

/// `YYYY-MM-DD` from an ISO date or timestamp, without timezone shifting.
pub fn to_date_string(value: &JsonValue) -> Option<String> {
    let text = to_optional_string(value)?;
    let trimmed = text.trim();
    Some(trimmed.get(..10).unwrap_or(trimmed).to_string())
}

/// Wall-clock timestamp on the local clock, the same clock as
/// `DashboardQuery::as_of`. Offset-bearing values are converted; naive values
/// are taken as already local.
pub fn to_timestamp(value: &JsonValue) -> Option<NaiveDateTime> {
    let text = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn to_bool(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "yes" | "y" | "1"
        ),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => false,
    }
}

/// Cosmetic remap of known assistant aliases; identity keys are untouched.
pub fn to_display_assistant_name(name: &str) -> String {
    let key = name.trim().to_lowercase();
    ASSISTANT_DISPLAY_NAMES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, display)| display.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Field accessors over a raw row. Missing columns read as null.
pub trait RowExt {
    fn field(&self, key: &str) -> &JsonValue;

    /// First of `keys` holding a non-null value, for columns that were
    /// renamed across schema versions.
    fn first_present(&self, keys: &[&str]) -> &JsonValue {
        keys.iter()
            .map(|key| self.field(key))
            .find(|value| !value.is_null())
            .unwrap_or(&NULL)
    }

    fn number(&self, key: &str) -> f64 {
        to_number(self.field(key), 0.0)
    }

    fn optional_number(&self, key: &str) -> Option<f64> {
        to_optional_number(self.field(key))
    }

    fn text(&self, key: &str) -> String {
        to_string_value(self.field(key), "")
    }

    fn text_or(&self, key: &str, fallback: &str) -> String {
        to_string_value(self.field(key), fallback)
    }

    fn optional_text(&self, key: &str) -> Option<String> {
        to_optional_string(self.field(key))
    }

    fn flag(&self, key: &str) -> bool {
        to_bool(self.field(key))
    }
}

impl RowExt for RawRow {
    fn field(&self, key: &str) -> &JsonValue {
        self.get(key).unwrap_or(&NULL)
    }
}
