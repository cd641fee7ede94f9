//! Standardized error responses for the dashboard API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metrics::MetricsError;

/// Standard API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code (e.g. "FETCH_FAILED", "BAD_REQUEST")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// A metric domain could not be fetched, even after its fallbacks.
    FetchFailed { domain: String, message: String },
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::FetchFailed { domain, message } => {
                tracing::error!("Fetch failed ({}): {}", domain, message);
                format!("Could not load {}", domain)
            }
            Self::ServiceUnavailable(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = ApiError::new(self.error_code(), self.message());

        // Lets the client show a retry affordance on the failed domain only.
        if let Self::FetchFailed { domain, .. } = &self {
            let mut details = HashMap::new();
            details.insert("domain".to_string(), vec![domain.clone()]);
            error = error.with_details(details);
        }

        (status, Json(error)).into_response()
    }
}

impl From<MetricsError> for AppError {
    fn from(err: MetricsError) -> Self {
        match err {
            MetricsError::Fetch { domain, source } => Self::FetchFailed {
                domain: domain.to_string(),
                message: source.to_string(),
            },
            MetricsError::InvalidRequest(msg) => Self::BadRequest(msg),
        }
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, AppError>;
