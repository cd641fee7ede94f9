// Integration tests for the dashboard snapshot endpoint

use axum::http::StatusCode;
use std::sync::Arc;

use crate::tests::fixtures::{alert_view_row, client_health_row, ScriptedSource};
use crate::tests::helpers::{get_json, test_app};

#[cfg(test)]
mod dashboard_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_reports_partial_failure() {
        let source = Arc::new(
            ScriptedSource::new()
                .rows("v_dashboard_alerts", "canonical", vec![alert_view_row("capacity", 2, 1)])
                .rows(
                    "v_client_health",
                    "canonical",
                    vec![client_health_row("f1", "a1", "Amber", 8)],
                )
                .down("foh_performance", "canonical"),
        );

        let (status, body) = get_json(test_app(&source), "/api/v1/dashboard?period=last_30_days").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["cycle_id"].is_string());
        assert!(body["errors"]["foh_performance"].is_string());
        assert_eq!(body["alerts"].as_array().unwrap().len(), 4);
        assert_eq!(body["alerts"][0]["category"], "client_health");
        assert_eq!(body["alerts"][0]["amber_count"], 1);
        assert_eq!(body["alerts"][3]["category"], "capacity");
        assert_eq!(body["alerts"][3]["red_count"], 2);
        assert_eq!(body["attention_clients"][0]["family_id"], "f1");
    }

    #[tokio::test]
    async fn test_snapshot_rejects_unknown_strategy() {
        let source = Arc::new(ScriptedSource::new());
        let (status, _) = get_json(test_app(&source), "/api/v1/dashboard?strategy=nope").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
