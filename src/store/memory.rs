use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{DocumentStore, StoreError};
use crate::records::Record;

pub type MutexMap<T> = Mutex<HashMap<String, T>>;

/// In-process document store.
///
/// Counters only live as long as the process, so this is meant for tests and
/// single instance demos.
#[derive(Default)]
pub struct MemoryStore {
    counters: MutexMap<i64>,
    records: Mutex<Vec<Record>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Unavailable {
        reason: "memory store lock poisoned".into(),
    })
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all kinds.
    pub fn record_count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Current value of a counter without touching it.
    pub fn counter_value(&self, name: &str) -> Option<i64> {
        self.counters
            .lock()
            .ok()
            .and_then(|c| c.get(name).copied())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn increment_counter(&self, name: &str) -> Result<i64, StoreError> {
        let mut counters = lock(&self.counters)?;
        let value = counters.entry(name.to_owned()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut records = lock(&self.records)?;

        if records
            .iter()
            .any(|r| r.kind == record.kind && r.id == record.id)
        {
            return Err(StoreError::Duplicate {
                kind: record.kind.clone(),
                id: record.id.clone(),
            });
        }

        records.push(record.clone());
        Ok(())
    }

    async fn list_records(&self, kind: &str) -> Result<Vec<Record>, StoreError> {
        let records = lock(&self.records)?;

        let mut found: Vec<Record> = records.iter().filter(|r| r.kind == kind).cloned().collect();
        // stable, so records created in the same instant keep insertion order
        found.sort_by_key(|r| r.created_at);

        Ok(found)
    }

    async fn find_record(&self, kind: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let records = lock(&self.records)?;

        Ok(records
            .iter()
            .find(|r| r.kind == kind && r.id == id)
            .cloned())
    }
}
