//! In-memory store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use vettest_core::error::StoreError;
use vettest_core::traits::{EvaluationRecord, ResultStore};

/// Keeps records in process memory.
///
/// Failures queued with [`MemoryStore::fail_next`] are returned by the next
/// `save` calls, in order, before anything is stored.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EvaluationRecord>>,
    failures: Mutex<VecDeque<StoreError>>,
    save_calls: AtomicU32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save` fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        lock(&self.failures).push_back(error);
    }

    /// Number of `save` calls, including failed ones.
    pub fn save_calls(&self) -> u32 {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, record: &EvaluationRecord) -> Result<(), StoreError> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(error) = lock(&self.failures).pop_front() {
            return Err(error);
        }

        let mut records = lock(&self.records);
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Conflict(record.id.to_string()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<EvaluationRecord, StoreError> {
        lock(&self.records)
            .iter()
            .find(|r| r.id == *id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        let mut records = lock(&self.records).clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
