// Dashboard cycle: concurrent domains, alert board precedence, isolation

use opsdash_shared::{FilterState, HealthStatus};
use std::sync::Arc;

use crate::alerts::AlertCounts;
use crate::dashboard::{load_snapshot, AlertCategory, HIGHLIGHT_LIMIT};
use crate::metrics::{MetricDomain, PerformanceStrategy};
use crate::tests::fixtures::{
    alert_view_row, capacity_row, client_health_row, performance_row, stuck_task_row, ScriptedSource,
};
use crate::tests::helpers::{aggregator, query};

fn card(snapshot: &crate::dashboard::DashboardSnapshot, category: AlertCategory) -> AlertCounts {
    snapshot
        .alerts
        .iter()
        .find(|c| c.category == category)
        .map(|c| c.counts)
        .unwrap()
}

#[tokio::test]
async fn test_failed_domain_does_not_block_the_others() {
    let source = Arc::new(
        ScriptedSource::new()
            .rows(
                "v_client_health",
                "canonical",
                vec![
                    client_health_row("f1", "a1", "Red", 25),
                    client_health_row("f2", "a1", "Amber", 10),
                    client_health_row("f3", "a2", "Green", 1),
                ],
            )
            .rows("foh_performance", "canonical", vec![performance_row("a1", 50.0)])
            .down("v_stuck_tasks", "canonical"),
    );

    let snapshot = load_snapshot(
        &aggregator(&source),
        &query(FilterState::default()),
        PerformanceStrategy::Threshold,
    )
    .await;

    assert_eq!(snapshot.errors.len(), 1);
    assert!(snapshot.errors.contains_key(&MetricDomain::StuckTasks));
    assert!(snapshot.stuck_tasks.is_empty());
    assert_eq!(snapshot.attention_clients.len(), 2);
    assert!(snapshot
        .attention_clients
        .iter()
        .all(|c| c.health_status != HealthStatus::Green));
    assert_eq!(snapshot.flagged_assistants.len(), 1);
    assert_eq!(card(&snapshot, AlertCategory::ClientHealth), AlertCounts::new(1, 1));
    assert_eq!(card(&snapshot, AlertCategory::Performance), AlertCounts::new(1, 0));
    assert_eq!(card(&snapshot, AlertCategory::StuckTasks), AlertCounts::default());
}

#[tokio::test]
async fn test_computed_counts_override_view_rows() {
    let source = Arc::new(
        ScriptedSource::new()
            .rows(
                "v_dashboard_alerts",
                "canonical",
                vec![
                    alert_view_row("Client Health", 9, 9),
                    alert_view_row("FOH Capacity", 4, 2),
                    alert_view_row("stuck", 3, 0),
                ],
            )
            .rows(
                "v_client_health",
                "canonical",
                vec![client_health_row("f1", "a1", "Purple", 3)],
            )
            .rows("v_foh_capacity", "canonical", vec![capacity_row("a1", 12, 10, 12)])
            .rows(
                "v_stuck_tasks",
                "canonical",
                vec![stuck_task_row("t1", "Stuck", 14), stuck_task_row("t2", "Delayed", 5)],
            ),
    );

    let snapshot = load_snapshot(
        &aggregator(&source),
        &query(FilterState::default()),
        PerformanceStrategy::Threshold,
    )
    .await;

    assert!(snapshot.errors.is_empty());
    assert_eq!(card(&snapshot, AlertCategory::ClientHealth), AlertCounts::new(0, 1));
    assert_eq!(card(&snapshot, AlertCategory::StuckTasks), AlertCounts::new(1, 1));
    // The view's capacity row is kept; computed capacity only fills a gap.
    assert_eq!(card(&snapshot, AlertCategory::Capacity), AlertCounts::new(4, 2));
}

#[tokio::test]
async fn test_capacity_computed_when_view_is_silent() {
    let source = Arc::new(ScriptedSource::new().rows(
        "v_foh_capacity",
        "canonical",
        vec![
            capacity_row("a1", 12, 10, 12),
            capacity_row("a2", 11, 10, 12),
            capacity_row("a3", 5, 10, 12),
        ],
    ));

    let snapshot = load_snapshot(
        &aggregator(&source),
        &query(FilterState::default()),
        PerformanceStrategy::Threshold,
    )
    .await;

    assert_eq!(card(&snapshot, AlertCategory::Capacity), AlertCounts::new(1, 1));
    assert_eq!(snapshot.alerts.len(), AlertCategory::ALL.len());
}

#[tokio::test]
async fn test_highlights_are_capped() {
    let rows = (0..8)
        .map(|i| client_health_row(&format!("f{}", i), "a1", "Red", 40 - i))
        .collect();
    let source = Arc::new(ScriptedSource::new().rows("v_client_health", "canonical", rows));
    let dashboard_query = query(FilterState::default());

    let snapshot = load_snapshot(&aggregator(&source), &dashboard_query, PerformanceStrategy::Threshold).await;

    assert_eq!(snapshot.attention_clients.len(), HIGHLIGHT_LIMIT);
    assert_eq!(snapshot.attention_clients[0].family_id, "f0");
    assert_eq!(card(&snapshot, AlertCategory::ClientHealth), AlertCounts::new(8, 0));
    assert_eq!(snapshot.query_key, dashboard_query.query_key(MetricDomain::Dashboard));
}
