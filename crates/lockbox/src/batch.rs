//! Bounded fan-out of blocking work.
//!
//! Each job runs on the blocking pool, at most `limit` at a time. Results
//! come back in input order and one failing job never affects another.
//! Dropping the returned future abandons the batch: jobs already running
//! finish on the blocking pool and their results are discarded.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{LockboxError, Result};

pub(crate) async fn run_blocking<T, F>(limit: usize, jobs: Vec<F>) -> Vec<Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let total = jobs.len();
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| LockboxError::Task(e.to_string()));
            let outcome = tokio::task::spawn_blocking(job)
                .await
                .map_err(|e| LockboxError::Task(e.to_string()))
                .and_then(|r| r);
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<Result<T>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, outcome)) = joined {
            slots[index] = Some(outcome);
        }
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(LockboxError::Task("worker aborted".into()))))
        .collect()
}

/// Run a single blocking job.
pub(crate) async fn blocking<T, F>(job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| LockboxError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_results_in_input_order() {
        let jobs: Vec<_> = (0..20u64)
            .map(|i| {
                move || {
                    std::thread::sleep(std::time::Duration::from_millis(20 - i));
                    Ok(i)
                }
            })
            .collect();

        let results = run_blocking(4, jobs).await;
        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let jobs: Vec<_> = (0..5)
            .map(|i| {
                move || {
                    if i == 2 {
                        Err(LockboxError::RecordNotFound(format!("r{}", i)))
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();

        let results = run_blocking(2, jobs).await;
        assert_eq!(results.len(), 5);
        assert!(matches!(results[2], Err(LockboxError::RecordNotFound(_))));
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 4);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..12)
            .map(|_| {
                let active = active.clone();
                let peak = peak.clone();
                move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .collect();

        run_blocking(3, jobs).await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let jobs: Vec<fn() -> Result<()>> = Vec::new();
        assert!(run_blocking(4, jobs).await.is_empty());
    }
}
