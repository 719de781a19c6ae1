//! Completion log store
//!
//! Ordered append-only log of finished routines, persisted as one JSON
//! snapshot file.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::storage;
use crate::models::completions::CompletionRecord;

const COMPLETIONS_FILE: &str = "completions.json";

pub struct CompletionLogStore {
    path: PathBuf,
    records: Vec<CompletionRecord>,
}

impl CompletionLogStore {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(COMPLETIONS_FILE);
        let records = storage::load_snapshot(&path);
        Self { path, records }
    }

    pub fn append(&mut self, record: CompletionRecord) {
        self.records.push(record);
        self.persist();
    }

    /// Remove a record by id, returning it so the caller can roll back the
    /// aggregate it contributed to.
    pub fn remove(&mut self, id: Uuid) -> Option<CompletionRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let removed = self.records.remove(index);
        self.persist();
        Some(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<&CompletionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records completed within the last `days` days.
    pub fn recent(&self, days: i64) -> Vec<CompletionRecord> {
        let cutoff = Utc::now() - Duration::days(days);
        self.records
            .iter()
            .filter(|r| r.completed_at >= cutoff)
            .cloned()
            .collect()
    }

    /// Replace the whole log with the remote's records after a full pull.
    pub fn replace_all(&mut self, records: Vec<CompletionRecord>) {
        self.records = records;
        self.persist();
    }

    pub fn all(&self) -> &[CompletionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) {
        if let Err(e) = storage::save_snapshot(&self.path, &self.records) {
            log::warn!("Completion log persist failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Identity;

    fn record(routine: &str, minutes: u32, days_ago: i64) -> CompletionRecord {
        CompletionRecord::new(
            Identity::Device(Uuid::new_v4()),
            routine,
            minutes,
            Utc::now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_append_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CompletionLogStore::load(dir.path());

        let rec = record("morning-flow", 10, 0);
        let id = rec.id;
        store.append(rec.clone());

        assert_eq!(store.get(id), Some(&rec));
        assert_eq!(store.remove(id), Some(rec));
        assert_eq!(store.remove(id), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_recent_filters_by_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CompletionLogStore::load(dir.path());

        store.append(record("a", 5, 0));
        store.append(record("b", 5, 3));
        store.append(record("c", 5, 45));

        let recent = store.recent(30);
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.routine_id != "c"));
    }

    #[test]
    fn test_log_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("a", 5, 0), record("b", 8, 1)];
        {
            let mut store = CompletionLogStore::load(dir.path());
            store.replace_all(records.clone());
        }
        let reloaded = CompletionLogStore::load(dir.path());
        assert_eq!(reloaded.all(), records.as_slice());
    }
}
