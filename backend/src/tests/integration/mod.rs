mod api_dashboard;
mod api_metrics;
