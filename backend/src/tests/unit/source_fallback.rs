// Compatibility adapters across domains

use opsdash_shared::FilterState;
use std::sync::Arc;

use crate::metrics::{MetricDomain, MetricsError};
use crate::source::SourceError;
use crate::tests::fixtures::{stuck_task_row, ScriptedSource};
use crate::tests::helpers::{aggregator, query};

#[tokio::test]
async fn test_stuck_tasks_fall_back_to_days_open() {
    let source = Arc::new(
        ScriptedSource::new()
            .drift("v_stuck_tasks", "canonical")
            .rows(
                "v_stuck_tasks",
                "days_open",
                vec![serde_json::json!({ "task_id": "t1", "days_open": 12, "task_state": "open" })],
            ),
    );

    let rows = aggregator(&source)
        .stuck_tasks(&query(FilterState::default()), Some("all"))
        .await
        .unwrap();

    assert_eq!(rows[0].days_since_update, 12.0);
    assert_eq!(rows[0].task_status, "open");
}

#[tokio::test]
async fn test_exhausted_adapters_report_the_last_error() {
    let source = Arc::new(
        ScriptedSource::new()
            .drift("v_toggl_detail", "canonical")
            .drift("v_toggl_detail", "all_sources"),
    );

    let err = tokio_test::assert_err!(aggregator(&source).toggl_detail(&query(FilterState::default())).await);

    match err {
        MetricsError::Fetch { domain, source: inner } => {
            assert_eq!(domain, MetricDomain::TogglDetail);
            assert!(matches!(inner, SourceError::UnsupportedShape { ref message, .. } if message.contains("all_sources")));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        source.labels(),
        vec!["v_toggl_detail:canonical", "v_toggl_detail:all_sources"]
    );
}

#[tokio::test]
async fn test_task_status_selection_is_stripped() {
    let source = Arc::new(
        ScriptedSource::new().rows("v_stuck_tasks", "canonical", vec![stuck_task_row("t1", "Aging", 6)]),
    );

    aggregator(&source)
        .stuck_tasks(&query(FilterState::default()), Some("3. Waiting on client"))
        .await
        .unwrap();

    assert_eq!(
        source.calls()[0].params[2],
        crate::source::SqlParam::Text(Some("Waiting on client".into()))
    );
}

#[tokio::test]
async fn test_blank_family_id_is_rejected_before_querying() {
    let source = Arc::new(ScriptedSource::new());
    let agg = aggregator(&source);

    assert!(matches!(
        agg.recent_client_tasks("  ").await,
        Err(MetricsError::InvalidRequest(_))
    ));
    assert!(matches!(
        agg.client_time_breakdown(&query(FilterState::default()), "").await,
        Err(MetricsError::InvalidRequest(_))
    ));
    assert!(source.calls().is_empty());
}
