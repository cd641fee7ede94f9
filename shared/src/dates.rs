use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::filters::{FilterState, TimePeriod};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive calendar-day interval. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { from: a, to: b }
        } else {
            Self { from: b, to: a }
        }
    }

    pub fn from_iso(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    pub fn to_iso(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }

    /// Start-of-day and end-of-day timestamp strings for timestamp columns.
    pub fn timestamp_bounds(&self) -> (String, String) {
        (
            format!("{}T00:00:00.000", self.from_iso()),
            format!("{}T23:59:59.999", self.to_iso()),
        )
    }

    pub fn num_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from_iso(), self.to_iso())
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Resolve the filter's period to concrete bounds relative to `today`.
///
/// `custom` only applies when both bounds parse; otherwise it resolves like
/// `last_7_days`.
pub fn resolve(state: &FilterState, today: NaiveDate) -> DateRange {
    if state.period == TimePeriod::Custom {
        let from = state.from.as_deref().and_then(parse_date);
        let to = state.to.as_deref().and_then(parse_date);
        if let (Some(from), Some(to)) = (from, to) {
            return DateRange::new(from, to);
        }
    }

    let monday = start_of_week(today);

    match state.period {
        TimePeriod::ThisWeek => DateRange::new(monday, today),
        TimePeriod::LastWeek => DateRange::new(
            monday - Duration::days(7),
            monday - Duration::days(1),
        ),
        TimePeriod::ThisMonth => DateRange::new(first_of_month(today), today),
        TimePeriod::LastMonth => {
            let last_of_previous = first_of_month(today) - Duration::days(1);
            DateRange::new(first_of_month(last_of_previous), last_of_previous)
        }
        TimePeriod::Last30Days => DateRange::new(today - Duration::days(29), today),
        TimePeriod::Last90Days => DateRange::new(today - Duration::days(89), today),
        TimePeriod::Last7Days | TimePeriod::Custom => {
            DateRange::new(today - Duration::days(6), today)
        }
    }
}

/// Monday of the week containing `day`; Sunday belongs to the week that
/// started six days earlier.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
