use serde::{Deserialize, Serialize};

use crate::status::{HealthStatus, LoadLevel, PerformanceStatus, StuckStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientHealthRow {
    pub family_id: String,
    pub family_name: String,
    pub assistant_id: String,
    pub assistant_name: String,
    pub contract: Option<String>,
    pub subscription_type: Option<String>,
    pub life_transitions: Option<String>,
    pub life_transition_icons: Option<String>,
    pub active_tasks: f64,
    pub days_since_last_task: i64,
    pub health_status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FohPerformanceRow {
    pub assistant_id: String,
    pub assistant_name: String,
    pub tasks_completed: f64,
    pub active_tasks: f64,
    pub avg_mins_per_task: f64,
    pub client_count: f64,
    pub red_clients: u32,
    pub amber_clients: u32,
    pub performance_status: PerformanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FohCapacityRow {
    pub assistant_id: String,
    pub assistant_name: String,
    pub current_clients: f64,
    pub base_capacity: f64,
    pub max_capacity: f64,
    pub available_slots: f64,
    /// Source label, passed through untouched.
    pub capacity_status: String,
    pub can_take_holiday_cover: bool,
}

impl FohCapacityRow {
    /// Colour of the capacity bar. Derived on demand, never stored.
    pub fn bar_level(&self) -> LoadLevel {
        if self.current_clients >= self.max_capacity {
            LoadLevel::Red
        } else if self.current_clients > self.base_capacity {
            LoadLevel::Amber
        } else {
            LoadLevel::Green
        }
    }

    /// Fill percentage of the bar, clamped to 100.
    pub fn fill_percent(&self) -> u32 {
        let pct = (self.current_clients / self.max_capacity.max(1.0) * 100.0).round();
        pct.clamp(0.0, 100.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckTaskRow {
    pub task_id: String,
    pub task_title: String,
    pub family_id: String,
    pub family_name: String,
    pub assistant_id: String,
    pub assistant_name: String,
    pub days_since_update: f64,
    pub task_state: String,
    pub task_status: String,
    pub category: Option<String>,
    pub stuck_status: StuckStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDetailRow {
    pub task_id: String,
    pub family_id: String,
    pub family_name: String,
    pub assistant_id: String,
    pub assistant_name: String,
    pub task_title: String,
    pub category: Option<String>,
    pub closed_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentClientTaskRow {
    pub title: String,
    pub category: Option<String>,
    pub task_state: String,
    pub created_at: String,
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TogglDetailRow {
    pub entry_id: String,
    pub family_id: String,
    pub family_name: String,
    pub assistant_id: String,
    pub assistant_name: String,
    pub category: Option<String>,
    pub minutes: f64,
    pub entry_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTimeBreakdownRow {
    pub family_id: String,
    pub category: String,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTimeTotalRow {
    pub family_id: String,
    pub family_name: String,
    pub total_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexUsageRow {
    pub family_id: String,
    pub flex_tasks_used: f64,
    /// Allotment left, never negative.
    pub flex_tasks_remaining: f64,
    pub usage_level: LoadLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAlertsRow {
    pub alert_type: String,
    pub red_count: f64,
    pub amber_count: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub assistant_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRow {
    pub id: String,
    pub family_name: String,
    pub contract: Option<String>,
}
