//! Connection pool for the source database. The dashboard only reads, so
//! sessions are opened read-only with a statement timeout and the database is
//! never created or migrated from here.

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;

use crate::config::SourcePoolConfig;

/// `-c key=value` settings sent with every new session.
pub fn session_settings(config: &SourcePoolConfig) -> Vec<(&'static str, String)> {
    let mut settings = Vec::new();
    if config.read_only {
        settings.push(("default_transaction_read_only", "on".to_string()));
    }
    if let Some(timeout) = config.statement_timeout {
        settings.push(("statement_timeout", timeout.as_millis().to_string()));
    }
    settings
}

pub async fn connect_source(database_url: &str, config: &SourcePoolConfig) -> anyhow::Result<PgPool> {
    let options = PgConnectOptions::from_str(database_url)?.options(session_settings(config));

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        read_only = config.read_only,
        statement_timeout_ms = config.statement_timeout.map(|t| t.as_millis() as u64),
        "Source pool ready"
    );

    Ok(pool)
}
