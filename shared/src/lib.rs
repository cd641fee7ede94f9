pub mod dates;
pub mod display;
pub mod filters;
pub mod rows;
pub mod status;

pub use dates::{resolve, DateRange};
pub use filters::{FilterPatch, FilterState, TimePeriod};
pub use rows::*;
pub use status::{HealthStatus, LoadLevel, PerformanceStatus, StuckStatus};
