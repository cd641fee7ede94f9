// Client health pipeline against a scripted source

use opsdash_shared::{FilterState, HealthStatus};
use std::sync::Arc;

use crate::metrics::client_health::finish_client_health;
use crate::metrics::rules::NEVER_ACTIVE_SENTINEL_DAYS;
use crate::metrics::{MetricDomain, MetricsError};
use crate::source::SqlParam;
use crate::tests::fixtures::{client_health_row, sparse_client_health_row, ScriptedSource};
use crate::tests::helpers::{aggregator, query};

#[tokio::test]
async fn test_complete_rows_skip_activity_query() {
    let source = Arc::new(ScriptedSource::new().rows(
        "v_client_health",
        "canonical",
        vec![
            client_health_row("f1", "a1", "Green", 2),
            client_health_row("f2", "a1", "Red", 21),
        ],
    ));

    let rows = tokio_test::assert_ok!(
        aggregator(&source)
            .client_health(&query(FilterState::default()))
            .await
    );

    assert_eq!(rows.len(), 2);
    assert_eq!(source.labels(), vec!["v_client_health:canonical"]);
}

#[tokio::test]
async fn test_sparse_rows_merge_activity() {
    let source = Arc::new(
        ScriptedSource::new()
            .rows(
                "v_client_health",
                "canonical",
                vec![
                    sparse_client_health_row("f1", "a1", "Amber"),
                    sparse_client_health_row("f2", "a1", "Green"),
                ],
            )
            .rows(
                "tasks",
                "family_activity",
                vec![serde_json::json!({
                    "family_id": "f1",
                    "active_tasks": 3,
                    "last_activity_at": "2024-03-05T10:00:00",
                })],
            ),
    );

    let rows = aggregator(&source)
        .client_health(&query(FilterState::default()))
        .await
        .unwrap();

    assert_eq!(
        source.labels(),
        vec!["v_client_health:canonical", "tasks:family_activity"]
    );
    // Least recently active first; f2 has no activity at all.
    assert_eq!(rows[0].family_id, "f2");
    assert_eq!(rows[0].days_since_last_task, NEVER_ACTIVE_SENTINEL_DAYS);
    assert_eq!(rows[0].active_tasks, 0.0);
    assert_eq!(rows[1].family_id, "f1");
    assert_eq!(rows[1].active_tasks, 3.0);
    assert_eq!(rows[1].days_since_last_task, 9);
}

#[tokio::test]
async fn test_status_filter_applies_after_merge() {
    let source = Arc::new(ScriptedSource::new().rows(
        "v_client_health",
        "canonical",
        vec![
            client_health_row("f1", "a1", "Red", 30),
            client_health_row("f2", "a1", "Green", 1),
            client_health_row("f3", "a2", "purple", 4),
        ],
    ));
    let filters = FilterState::default().with_status(["Red", "Purple"]);

    let rows = aggregator(&source).client_health(&query(filters)).await.unwrap();

    let ids: Vec<&str> = rows.iter().map(|r| r.family_id.as_str()).collect();
    assert_eq!(ids, vec!["f1", "f3"]);
    assert_eq!(rows[1].health_status, HealthStatus::Purple);

    // Status never reaches the source; only assistant, family and plan lists do.
    let calls = source.calls();
    assert_eq!(calls[0].params.len(), 3);
    assert!(calls[0]
        .params
        .iter()
        .all(|p| matches!(p, SqlParam::TextList(values) if values.is_empty())));
}

#[tokio::test]
async fn test_selections_reach_the_source() {
    let source = Arc::new(ScriptedSource::new());
    let filters = FilterState {
        assistant: vec!["a1".into(), "a2".into()],
        client: vec!["f9".into()],
        ..Default::default()
    };

    aggregator(&source).client_health(&query(filters)).await.unwrap();

    let calls = source.calls();
    assert_eq!(calls[0].params[0], SqlParam::TextList(vec!["a1".into(), "a2".into()]));
    assert_eq!(calls[0].params[1], SqlParam::TextList(vec!["f9".into()]));
    assert_eq!(calls[0].params[2], SqlParam::TextList(vec![]));
}

#[tokio::test]
async fn test_missing_subscription_column_uses_contract_adapter() {
    let source = Arc::new(
        ScriptedSource::new()
            .drift("v_client_health", "canonical")
            .rows(
                "v_client_health",
                "contract_only",
                vec![client_health_row("f1", "a1", "Amber", 12)],
            ),
    );

    let rows = aggregator(&source)
        .client_health(&query(FilterState::default()))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].subscription_type.as_deref(), Some("Core"));
    assert_eq!(
        source.labels(),
        vec!["v_client_health:canonical", "v_client_health:contract_only"]
    );
}

#[tokio::test]
async fn test_transport_failure_is_reported_for_the_domain() {
    let source = Arc::new(ScriptedSource::new().down("v_client_health", "canonical"));

    let err = aggregator(&source)
        .client_health(&query(FilterState::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, MetricsError::Fetch { domain: MetricDomain::ClientHealth, .. }));
    assert_eq!(source.labels(), vec!["v_client_health:canonical"]);
}

#[tokio::test]
async fn test_finishing_is_idempotent() {
    let source = Arc::new(ScriptedSource::new().rows(
        "v_client_health",
        "canonical",
        vec![
            client_health_row("f1", "a1", "Amber", 3),
            client_health_row("f2", "a1", "Red", 40),
            client_health_row("f3", "a1", "Amber", 3),
        ],
    ));
    let statuses = vec!["Amber".to_string()];

    let once = aggregator(&source)
        .client_health(&query(FilterState::default().with_status(statuses.clone())))
        .await
        .unwrap();
    let twice = finish_client_health(once.clone(), &statuses);

    assert_eq!(once, twice);
    // Stable: equal days keep their source order.
    assert_eq!(once[0].family_id, "f1");
    assert_eq!(once[1].family_id, "f3");
}
