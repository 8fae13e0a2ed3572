//! Shared application state

use gantry_core::domain::source::SourceInfo;
use gantry_runner::ExecutionService;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub executor: Arc<dyn ExecutionService>,
    pub source: SourceInfo,
    /// Admission limit for concurrent runs; `None` when unlimited
    limiter: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        executor: Arc<dyn ExecutionService>,
        source: SourceInfo,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            pool,
            executor,
            source,
            limiter: run_limiter(max_concurrent_runs),
        }
    }

    /// Waits for a run slot
    ///
    /// Returns `None` when runs are unlimited; the slot is released when the
    /// permit is dropped.
    pub async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        match &self.limiter {
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}

fn run_limiter(max_concurrent_runs: usize) -> Option<Arc<Semaphore>> {
    (max_concurrent_runs > 0).then(|| Arc::new(Semaphore::new(max_concurrent_runs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_unlimited() {
        assert!(run_limiter(0).is_none());
        assert_eq!(run_limiter(1).unwrap().available_permits(), 1);
    }
}
