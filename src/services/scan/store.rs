// In-memory scan record store

use crate::models::ScanRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// Scan records keyed by id. Records are inserted exactly once by triage
/// and never mutated afterwards; later phases only read. Ids are never
/// reused: re-triaging the same content creates a new record under a new
/// id. Records live for the process lifetime (no eviction).
#[derive(Default)]
pub struct ScanStore {
    records: RwLock<HashMap<String, ScanRecord>>,
}

impl ScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ScanRecord) {
        let mut records = self.records.write().expect("scan store lock poisoned");
        records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<ScanRecord> {
        let records = self.records.read().expect("scan store lock poisoned");
        records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("scan store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
