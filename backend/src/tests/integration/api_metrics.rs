// Integration tests for the metric endpoints

use axum::http::StatusCode;
use std::sync::Arc;

use crate::tests::fixtures::{capacity_row, client_health_row, performance_row, ScriptedSource};
use crate::tests::helpers::{get_json, test_app};

#[cfg(test)]
mod metrics_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let source = Arc::new(ScriptedSource::new());
        let (status, body) = get_json(test_app(&source), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(source.labels(), vec!["source:ping"]);
    }

    #[tokio::test]
    async fn test_health_check_reports_unreachable_source() {
        let source = Arc::new(ScriptedSource::new().down("source", "ping"));
        let (status, body) = get_json(test_app(&source), "/health").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_client_health_with_status_filter() {
        let source = Arc::new(ScriptedSource::new().rows(
            "v_client_health",
            "canonical",
            vec![
                client_health_row("f1", "a1", "Red", 30),
                client_health_row("f2", "a1", "Green", 2),
            ],
        ));

        let (status, body) = get_json(
            test_app(&source),
            "/api/v1/metrics/client-health?period=custom&from=2024-03-01&to=2024-03-10&status=Red",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "client_health");
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);
        assert_eq!(body["rows"][0]["family_id"], "f1");
        assert_eq!(body["rows"][0]["health_status"], "Red");
        assert_eq!(body["summary"]["red_count"], 1);
        assert_eq!(body["range"]["from"], "2024-03-01");
        assert_eq!(
            body["query_key"],
            "client_health?from=2024-03-01&period=custom&status=Red&to=2024-03-10#2024-03-01..2024-03-10"
        );
    }

    #[tokio::test]
    async fn test_performance_strategy_param() {
        let source = Arc::new(
            ScriptedSource::new().rows("foh_performance", "canonical", vec![performance_row("a1", 20.0)]),
        );

        let (status, body) = get_json(
            test_app(&source),
            "/api/v1/metrics/foh-performance?strategy=client_health",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["performance_status"], "Green");
        assert!(source.labels().contains(&"v_client_health:canonical".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_rejected() {
        let source = Arc::new(ScriptedSource::new());
        let (status, body) = get_json(
            test_app(&source),
            "/api/v1/metrics/foh-performance?strategy=vibes",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_names_the_domain() {
        let source = Arc::new(ScriptedSource::new().down("v_stuck_tasks", "canonical"));
        let (status, body) = get_json(test_app(&source), "/api/v1/metrics/stuck-tasks").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "FETCH_FAILED");
        assert_eq!(body["details"]["domain"][0], "stuck_tasks");
    }

    #[tokio::test]
    async fn test_blank_family_id_is_a_bad_request() {
        let source = Arc::new(ScriptedSource::new());
        let (status, _) = get_json(test_app(&source), "/api/v1/metrics/recent-tasks/%20").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_flex_usage_summary() {
        let source = Arc::new(ScriptedSource::new().rows(
            "families",
            "flex_usage",
            vec![
                serde_json::json!({ "family_id": "f1", "flex_tasks_used": 19 }),
                serde_json::json!({ "family_id": "f2", "flex_tasks_used": 15 }),
                serde_json::json!({ "family_id": "f3", "flex_tasks_used": 2 }),
            ],
        ));

        let (status, body) = get_json(test_app(&source), "/api/v1/metrics/flex-usage").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["red_count"], 1);
        assert_eq!(body["summary"]["amber_count"], 1);
        assert_eq!(body["rows"][0]["flex_tasks_remaining"], 1.0);
    }

    #[tokio::test]
    async fn test_client_health_rows_carry_labels() {
        let source = Arc::new(ScriptedSource::new().rows(
            "v_client_health",
            "canonical",
            vec![
                client_health_row("f1", "a1", "Purple", 400),
                client_health_row("f2", "a1", "Amber", 1),
            ],
        ));

        let (status, body) = get_json(test_app(&source), "/api/v1/metrics/client-health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["health_status"], "Purple");
        assert_eq!(body["rows"][0]["status_label"], "Renew");
        assert_eq!(body["rows"][0]["last_task_label"], "No tasks yet");
        assert_eq!(body["rows"][1]["status_label"], "Amber");
        assert_eq!(body["rows"][1]["last_task_label"], "1 day ago");
        assert_eq!(body["summary"]["amber_count"], 1);
    }

    #[tokio::test]
    async fn test_capacity_rows_carry_bar() {
        let source = Arc::new(ScriptedSource::new().rows(
            "v_foh_capacity",
            "canonical",
            vec![capacity_row("a1", 12, 10, 12), capacity_row("a2", 6, 10, 12)],
        ));

        let (status, body) = get_json(test_app(&source), "/api/v1/metrics/foh-capacity").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["assistant_id"], "a1");
        assert_eq!(body["rows"][0]["bar_level"], "Red");
        assert_eq!(body["rows"][0]["fill_percent"], 100);
        assert_eq!(body["rows"][1]["bar_level"], "Green");
        assert_eq!(body["rows"][1]["fill_percent"], 50);
        assert_eq!(body["summary"]["red_count"], 1);
    }

    #[tokio::test]
    async fn test_client_time_totals_carry_duration_label() {
        let source = Arc::new(ScriptedSource::new().rows(
            "v_toggl_detail",
            "canonical",
            vec![serde_json::json!({ "family_id": "f1", "family_name": "Acme", "total_minutes": 95 })],
        ));

        let (status, body) = get_json(test_app(&source), "/api/v1/metrics/client-time-totals").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rows"][0]["total_minutes"], 95.0);
        assert_eq!(body["rows"][0]["duration_label"], "1h 35m");
        assert!(body.get("summary").is_none());
    }
}
