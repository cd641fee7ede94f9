use serde::{Deserialize, Serialize};
use std::fmt;

/// Client engagement-recency class. `Purple` marks a renewal-due family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    Red,
    Amber,
    #[default]
    Green,
    Purple,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Amber => "Amber",
            Self::Green => "Green",
            Self::Purple => "Purple",
        }
    }

    /// Case-insensitive parse; anything unrecognised is Green.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "red" => Self::Red,
            "amber" => Self::Amber,
            "purple" => Self::Purple,
            _ => Self::Green,
        }
    }

    /// Label shown to users. Only the presentation layer should call this.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Purple => "Renew",
            other => other.as_str(),
        }
    }

    pub fn matches(&self, selector: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(selector.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PerformanceStatus {
    Red,
    Amber,
    #[default]
    Green,
}

impl PerformanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Amber => "Amber",
            Self::Green => "Green",
        }
    }

    pub fn matches(&self, selector: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(selector.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StuckStatus {
    #[default]
    Stuck,
    Aging,
    Delayed,
}

impl StuckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stuck => "Stuck",
            Self::Aging => "Aging",
            Self::Delayed => "Delayed",
        }
    }

    /// Case-insensitive parse; anything other than Aging/Delayed is Stuck.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "aging" => Self::Aging,
            "delayed" => Self::Delayed,
            _ => Self::Stuck,
        }
    }
}

/// Traffic-light used by capacity bars and flex usage badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadLevel {
    Red,
    Amber,
    #[default]
    Green,
}

impl LoadLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Amber => "Amber",
            Self::Green => "Green",
        }
    }
}

macro_rules! display_as_str {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(HealthStatus, PerformanceStatus, StuckStatus, LoadLevel);
