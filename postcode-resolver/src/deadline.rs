//! Deadline-bounded store queries.
//!
//! Every store query the resolver issues goes through [`run_bounded`], which
//! applies the configured deadline and folds the result into a
//! [`QueryOutcome`]. Call sites then decide explicitly what an empty result,
//! a timeout and a failure each mean for them, instead of catching errors.
//!
//! A query that outlives its deadline is dropped and the caller gets
//! control back immediately. Whatever the store still holds for it (the
//! embedded store's query slot, say) is the store's to release. Nothing is
//! retried.

use crate::error::ResolveError;
use postcode_spatial::SpatialError;
use std::future::Future;
use std::time::{Duration, Instant};

/// Result of one bounded store query.
#[derive(Debug)]
pub enum QueryOutcome<T> {
    /// The query returned a value.
    Found(T),

    /// The query succeeded with nothing to return.
    Empty,

    /// The deadline fired, or the store reported its deadline signature.
    TimedOut { elapsed: Duration },

    /// The store failed for any other reason.
    Failed(SpatialError),
}

impl<T> QueryOutcome<T> {
    /// Treat a found value as empty when `is_empty` says so.
    pub fn non_empty(self, is_empty: impl FnOnce(&T) -> bool) -> Self {
        match self {
            QueryOutcome::Found(value) if is_empty(&value) => QueryOutcome::Empty,
            other => other,
        }
    }

    /// Convert into a `Result`, with `Empty` becoming the given error.
    pub fn or_not_found(
        self,
        not_found: impl FnOnce() -> ResolveError,
    ) -> Result<T, ResolveError> {
        match self {
            QueryOutcome::Found(value) => Ok(value),
            QueryOutcome::Empty => Err(not_found()),
            QueryOutcome::TimedOut { elapsed } => Err(ResolveError::QueryTimeout { elapsed }),
            QueryOutcome::Failed(err) => Err(ResolveError::from_store(err, Duration::ZERO)),
        }
    }

    /// Convert into a `Result`, keeping `Empty` as `None`.
    pub fn into_result(self) -> Result<Option<T>, ResolveError> {
        match self {
            QueryOutcome::Found(value) => Ok(Some(value)),
            QueryOutcome::Empty => Ok(None),
            QueryOutcome::TimedOut { elapsed } => Err(ResolveError::QueryTimeout { elapsed }),
            QueryOutcome::Failed(err) => Err(ResolveError::from_store(err, Duration::ZERO)),
        }
    }
}

impl<T> QueryOutcome<Option<T>> {
    /// Fold `Found(None)` into `Empty`.
    pub fn flatten(self) -> QueryOutcome<T> {
        match self {
            QueryOutcome::Found(Some(value)) => QueryOutcome::Found(value),
            QueryOutcome::Found(None) | QueryOutcome::Empty => QueryOutcome::Empty,
            QueryOutcome::TimedOut { elapsed } => QueryOutcome::TimedOut { elapsed },
            QueryOutcome::Failed(err) => QueryOutcome::Failed(err),
        }
    }
}

/// Run a store query under a deadline.
pub async fn run_bounded<T, F>(limit: Duration, query: F) -> QueryOutcome<T>
where
    F: Future<Output = postcode_spatial::Result<T>>,
{
    let start = Instant::now();
    match tokio::time::timeout(limit, query).await {
        Ok(Ok(value)) => QueryOutcome::Found(value),
        Ok(Err(err)) if err.is_deadline_exceeded() => {
            tracing::warn!(error = %err, "store canceled query");
            QueryOutcome::TimedOut {
                elapsed: start.elapsed(),
            }
        }
        Ok(Err(err)) => QueryOutcome::Failed(err),
        Err(_) => {
            let elapsed = start.elapsed();
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "query deadline exceeded");
            QueryOutcome::TimedOut { elapsed }
        }
    }
}
