use tracing::{debug, warn};

use super::{DataSource, RawRow, SourceError, SourceQuery, SourceResult};

/// Hard cap on attempts per plan: the canonical query plus two adapters.
pub const MAX_QUERY_ATTEMPTS: usize = 3;

/// Canonical query plus an ordered list of compatibility adapters.
///
/// Attempts run strictly one after another. A failure only falls through to
/// the next adapter when the source reports an unsupported query shape; any
/// other error ends the plan immediately.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    canonical: SourceQuery,
    adapters: Vec<SourceQuery>,
}

impl QueryPlan {
    pub fn new(canonical: SourceQuery) -> Self {
        Self {
            canonical,
            adapters: Vec::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: SourceQuery) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn view(&self) -> &'static str {
        self.canonical.view
    }

    /// Attempts in execution order, capped at [`MAX_QUERY_ATTEMPTS`].
    pub fn attempts(&self) -> impl Iterator<Item = &SourceQuery> {
        std::iter::once(&self.canonical)
            .chain(self.adapters.iter())
            .take(MAX_QUERY_ATTEMPTS)
    }

    pub async fn execute(&self, source: &dyn DataSource) -> SourceResult<Vec<RawRow>> {
        let attempts: Vec<&SourceQuery> = self.attempts().collect();
        let mut last_error: Option<SourceError> = None;

        for (index, query) in attempts.iter().enumerate() {
            match source.fetch_rows(query).await {
                Ok(rows) => {
                    debug!(view = query.view, variant = query.variant, rows = rows.len(), "Query succeeded");
                    return Ok(rows);
                }
                Err(err) if err.is_unsupported_shape() => {
                    if let Some(next) = attempts.get(index + 1) {
                        warn!(
                            view = query.view,
                            failed = query.variant,
                            next = next.variant,
                            error = %err,
                            "Falling back to compatibility query"
                        );
                    }
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            SourceError::Transport(format!("No query attempts for {}", self.view()))
        }))
    }
}
