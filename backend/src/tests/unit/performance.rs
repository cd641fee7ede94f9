// Both performance strategies against a scripted source

use opsdash_shared::{FilterState, PerformanceStatus};
use std::sync::Arc;

use crate::metrics::PerformanceStrategy;
use crate::source::SqlParam;
use crate::tests::fixtures::{client_health_row, performance_row, ScriptedSource};
use crate::tests::helpers::{aggregator, query};

#[tokio::test]
async fn test_threshold_strategy() {
    let source = Arc::new(ScriptedSource::new().rows(
        "foh_performance",
        "canonical",
        vec![
            performance_row("a1", 0.0),
            performance_row("a2", 30.0),
            performance_row("a3", 45.1),
        ],
    ));

    let rows = aggregator(&source)
        .foh_performance(&query(FilterState::default()), PerformanceStrategy::Threshold)
        .await
        .unwrap();

    let statuses: Vec<PerformanceStatus> = rows.iter().map(|r| r.performance_status).collect();
    assert_eq!(
        statuses,
        vec![PerformanceStatus::Green, PerformanceStatus::Amber, PerformanceStatus::Red]
    );
    assert_eq!(source.labels(), vec!["foh_performance:canonical"]);
}

#[tokio::test]
async fn test_threshold_binds_the_resolved_range() {
    let source = Arc::new(ScriptedSource::new());

    aggregator(&source)
        .foh_performance(
            &query(FilterState::custom("2024-02-01", "2024-02-29")),
            PerformanceStrategy::Threshold,
        )
        .await
        .unwrap();

    let calls = source.calls();
    assert_eq!(calls[0].params[0], SqlParam::Text(Some("2024-02-01T00:00:00.000".into())));
    assert_eq!(calls[0].params[1], SqlParam::Text(Some("2024-02-29T23:59:59.999".into())));
}

#[tokio::test]
async fn test_client_health_strategy_ignores_status_filter() {
    let source = Arc::new(
        ScriptedSource::new()
            .rows(
                "foh_performance",
                "canonical",
                vec![performance_row("a1", 50.0), performance_row("a2", 50.0)],
            )
            .rows(
                "v_client_health",
                "canonical",
                vec![
                    client_health_row("f1", "a1", "Red", 20),
                    client_health_row("f2", "a1", "Amber", 9),
                    client_health_row("f3", "a2", "Purple", 2),
                ],
            ),
    );
    let filters = FilterState::default().with_status(["Red"]);

    let rows = aggregator(&source)
        .foh_performance(&query(filters), PerformanceStrategy::ClientHealth)
        .await
        .unwrap();

    assert_eq!(rows[0].red_clients, 1);
    assert_eq!(rows[0].amber_clients, 1);
    assert_eq!(rows[0].performance_status, PerformanceStatus::Red);
    // Renewal-due clients do not degrade performance.
    assert_eq!(rows[1].amber_clients, 0);
    assert_eq!(rows[1].performance_status, PerformanceStatus::Green);
}

#[tokio::test]
async fn test_minutes_column_adapter() {
    let source = Arc::new(
        ScriptedSource::new()
            .drift("foh_performance", "canonical")
            .rows("foh_performance", "minutes_column", vec![performance_row("a1", 31.0)]),
    );

    let rows = aggregator(&source)
        .foh_performance(&query(FilterState::default()), PerformanceStrategy::Threshold)
        .await
        .unwrap();

    assert_eq!(rows[0].performance_status, PerformanceStatus::Amber);
    assert!(source.calls()[1].sql.contains("te.minutes"));
}
