//! Retrying persistence.

use std::time::Duration;

use vettest_core::error::StoreError;
use vettest_core::traits::{EvaluationRecord, ResultStore};

/// Upper bound for the backoff between attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Save a record, retrying transient failures with exponential backoff.
///
/// Makes at most `max_retries + 1` attempts. Permanent errors (see
/// [`StoreError::is_permanent`]) are returned immediately.
pub async fn persist_with_retry(
    store: &dyn ResultStore,
    record: &EvaluationRecord,
    max_retries: u32,
    retry_delay: Duration,
) -> Result<(), StoreError> {
    let mut delay = retry_delay;
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
        }

        match store.save(record).await {
            Ok(()) => {
                if attempt > 0 {
                    tracing::info!(id = %record.id, attempt, "saved after retry");
                }
                return Ok(());
            }
            Err(e) if e.is_permanent() => {
                tracing::error!(id = %record.id, store = store.name(), "save failed: {e}");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    id = %record.id,
                    store = store.name(),
                    attempt,
                    max_retries,
                    "save failed, will retry: {e}"
                );
                last_error = Some(e);
            }
        }
    }

    let err = last_error.unwrap_or_else(|| StoreError::Unavailable("no attempt made".into()));
    tracing::error!(id = %record.id, store = store.name(), "giving up: {err}");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use vettest_core::model::{AnswerSet, Catalog};
    use vettest_core::{evaluate, ApprovalPolicy};

    fn record() -> EvaluationRecord {
        let catalog = Catalog {
            id: "c".into(),
            title: String::new(),
            role: "r".into(),
            kind: "personal".into(),
            sections: vec![],
        };
        let report = evaluate(&[], "r", &AnswerSet::new(), &ApprovalPolicy::default());
        EvaluationRecord::new("Ana", &catalog, AnswerSet::new(), report)
    }

    fn transient() -> StoreError {
        StoreError::Unavailable("busy".into())
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_from_transient_failures() {
        let store = MemoryStore::new();
        store.fail_next(transient());
        store.fail_next(transient());

        persist_with_retry(&store, &record(), 3, Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(store.save_calls(), 3);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.fail_next(transient());
        }

        let err = persist_with_retry(&store, &record(), 2, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.save_calls(), 3);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_errors_are_not_retried() {
        let store = MemoryStore::new();
        store.fail_next(StoreError::Conflict("dup".into()));

        let err = persist_with_retry(&store, &record(), 5, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.save_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_capped() {
        let store = MemoryStore::new();
        for _ in 0..4 {
            store.fail_next(transient());
        }

        let start = tokio::time::Instant::now();
        persist_with_retry(&store, &record(), 4, Duration::from_secs(20))
            .await
            .unwrap();
        // 20 + 30 + 30 + 30 seconds of (virtual) sleep.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(110));
        assert!(elapsed < Duration::from_secs(111));
    }
}
