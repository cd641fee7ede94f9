//! Data-source contract consumed by the metrics aggregator.
//!
//! A source runs one parametrised query and hands back loosely-typed rows.
//! Everything above this layer works on [`RawRow`] and normalises it
//! immediately.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value as JsonValue};

pub mod plan;
pub mod postgres;

pub use plan::{QueryPlan, MAX_QUERY_ATTEMPTS};
pub use postgres::PgSource;

/// One record as returned by the source, keyed by column name.
pub type RawRow = Map<String, JsonValue>;

/// Postgres SQLSTATE codes that mean "the query asks for a shape this
/// database does not have".
pub const SCHEMA_DRIFT_SQLSTATES: &[&str] = &[
    "42703", // undefined_column
    "42P01", // undefined_table
    "42883", // undefined_function
];

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Unsupported query shape ({code}): {message}")]
    UnsupportedShape { code: String, message: String },
    #[error("Query failed: {0}")]
    Transport(String),
}

impl SourceError {
    pub fn is_unsupported_shape(&self) -> bool {
        matches!(self, Self::UnsupportedShape { .. })
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                if SCHEMA_DRIFT_SQLSTATES.contains(&code.as_ref()) {
                    return Self::UnsupportedShape {
                        code: code.into_owned(),
                        message: db.message().to_string(),
                    };
                }
            }
        }
        Self::Transport(err.to_string())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Positional query parameter (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(Option<String>),
    TextList(Vec<String>),
    Date(NaiveDate),
}

/// A single executable query variant.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    /// Source view or table the query reads, used for logging and test routing
    pub view: &'static str,
    /// Variant label: `canonical` or the name of a compatibility adapter
    pub variant: &'static str,
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SourceQuery {
    pub fn new(view: &'static str, variant: &'static str, sql: impl Into<String>) -> Self {
        Self {
            view,
            variant,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: SqlParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn bind_all(mut self, params: impl IntoIterator<Item = SqlParam>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn label(&self) -> String {
        format!("{}:{}", self.view, self.variant)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_rows(&self, query: &SourceQuery) -> SourceResult<Vec<RawRow>>;
}
