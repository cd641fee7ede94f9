//! Formatting helpers for the presentation layer.

/// Beyond this many days a family is shown as never having had a task.
pub const NO_TASKS_YET_THRESHOLD_DAYS: i64 = 365;

pub fn days_ago(days: Option<i64>) -> String {
    match days {
        Some(d) if d <= NO_TASKS_YET_THRESHOLD_DAYS => {
            format!("{} day{} ago", d, if d == 1 { "" } else { "s" })
        }
        _ => "No tasks yet".to_string(),
    }
}

/// `95.0` -> `"1h 35m"`, `60.0` -> `"1h"`, `12.4` -> `"12m"`.
pub fn format_duration(minutes: f64) -> String {
    let rounded = if minutes.is_finite() {
        minutes.round().max(0.0) as i64
    } else {
        0
    };
    if rounded < 60 {
        return format!("{rounded}m");
    }
    let hours = rounded / 60;
    let mins = rounded % 60;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}
