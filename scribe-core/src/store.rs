//! In-memory classification store.
//!
//! Holds every record created during the process lifetime behind a single
//! read-write lock: lookups share the lock, inserts take it exclusively.
//! Nothing is persisted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::ScribeError;
use crate::models::ClassificationRecord;

#[derive(Debug, Default)]
pub struct ClassificationStore {
    records: RwLock<HashMap<String, Arc<ClassificationRecord>>>,
}

impl ClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` under its own `analysis_id`, replacing any record already
    /// held under that key.
    pub fn insert(&self, record: ClassificationRecord) -> Arc<ClassificationRecord> {
        let record = Arc::new(record);
        self.write()
            .insert(record.analysis_id.clone(), Arc::clone(&record));
        record
    }

    /// Fetch the record stored under `analysis_id`.
    pub fn lookup(&self, analysis_id: &str) -> Result<Arc<ClassificationRecord>, ScribeError> {
        self.read()
            .get(analysis_id)
            .cloned()
            .ok_or_else(|| ScribeError::NotFound(analysis_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A writer can only panic around a single `HashMap::insert` of a complete
    // value, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ClassificationRecord>>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ClassificationRecord>>> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }
}
