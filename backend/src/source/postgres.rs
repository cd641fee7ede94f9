use async_trait::async_trait;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use super::{DataSource, RawRow, SourceQuery, SourceResult, SqlParam};

/// PostgreSQL-backed data source.
///
/// Every query is wrapped so Postgres renders each result row as a JSON
/// object; the aggregator never sees driver-specific row types.
#[derive(Clone)]
pub struct PgSource {
    pool: PgPool,
    debug_sql: bool,
}

impl PgSource {
    pub fn new(pool: PgPool, debug_sql: bool) -> Self {
        Self { pool, debug_sql }
    }
}

#[async_trait]
impl DataSource for PgSource {
    async fn fetch_rows(&self, query: &SourceQuery) -> SourceResult<Vec<RawRow>> {
        let compiled = self.debug_sql.then(|| compile_sql_for_log(query));
        if let Some(sql) = &compiled {
            tracing::info!(target: "opsdash::sql", label = %query.label(), "{}", sql);
        }

        let wrapped = format!("SELECT row_to_json(q)::jsonb AS row FROM ({}) q", query.sql);
        let mut statement = sqlx::query_scalar::<_, JsonValue>(&wrapped);
        for param in &query.params {
            statement = match param {
                SqlParam::Text(value) => statement.bind(value.clone()),
                SqlParam::TextList(values) => statement.bind(values.clone()),
                SqlParam::Date(value) => statement.bind(*value),
            };
        }

        let values = statement.fetch_all(&self.pool).await.map_err(|err| {
            if let Some(sql) = &compiled {
                tracing::error!(target: "opsdash::sql", label = %query.label(), error = %err, "{}", sql);
            }
            err
        })?;

        Ok(values
            .into_iter()
            .filter_map(|value| match value {
                JsonValue::Object(row) => Some(row),
                _ => None,
            })
            .collect())
    }
}

fn escape_sql_literal(param: &SqlParam) -> String {
    fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    match param {
        SqlParam::Text(None) => "NULL".to_string(),
        SqlParam::Text(Some(value)) => quote(value),
        SqlParam::TextList(values) => format!(
            "ARRAY[{}]::text[]",
            values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
        ),
        SqlParam::Date(value) => quote(&value.format("%Y-%m-%d").to_string()),
    }
}

fn placeholder() -> Option<&'static Regex> {
    static PLACEHOLDER: OnceLock<Option<Regex>> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\$(\d+)").ok()).as_ref()
}

/// Render a query with its parameters inlined, for logs only. Placeholders
/// are substituted in one pass, so bound values are never rescanned.
pub fn compile_sql_for_log(query: &SourceQuery) -> String {
    let sql = match placeholder() {
        Some(re) => re
            .replace_all(&query.sql, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|index| query.params.get(index))
                    .map(escape_sql_literal)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned(),
        None => query.sql.clone(),
    };
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
