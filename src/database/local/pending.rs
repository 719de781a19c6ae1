//! Pending-operation queue
//!
//! Durable record of remote writes that failed and need a retry. The queue
//! does not decide retry cadence; the sync coordinator's interval gate does.
//! Entries live until the sync manager confirms the retried write succeeded.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::storage;
use crate::models::completions::CompletionRecord;
use crate::models::pending::{PendingCompletion, PendingDeletion};

const PENDING_FILE: &str = "pending.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingSnapshot {
    completions: Vec<PendingCompletion>,
    deletions: Vec<PendingDeletion>,
}

pub struct PendingQueue {
    path: PathBuf,
    completions: Vec<PendingCompletion>,
    deletions: Vec<PendingDeletion>,
}

impl PendingQueue {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(PENDING_FILE);
        let snapshot: PendingSnapshot = storage::load_snapshot(&path);
        Self {
            path,
            completions: snapshot.completions,
            deletions: snapshot.deletions,
        }
    }

    pub fn add_completion(&mut self, completion: CompletionRecord) {
        // A retried failure must not queue the same record twice
        if self.completions.iter().any(|p| p.completion.id == completion.id) {
            return;
        }
        self.completions.push(PendingCompletion::new(completion));
        self.persist();
    }

    pub fn add_deletion(&mut self, id: Uuid) {
        if self.deletions.iter().any(|p| p.id == id) {
            return;
        }
        self.deletions.push(PendingDeletion::new(id));
        self.persist();
    }

    /// Bump the retry bookkeeping after a failed completion retry.
    pub fn update_attempt(&mut self, id: Uuid) {
        if let Some(entry) = self.completions.iter_mut().find(|p| p.completion.id == id) {
            entry.attempt_count += 1;
            entry.last_attempt = Utc::now();
            self.persist();
        }
    }

    pub fn update_deletion_attempt(&mut self, id: Uuid) {
        if let Some(entry) = self.deletions.iter_mut().find(|p| p.id == id) {
            entry.attempt_count += 1;
            entry.last_attempt = Utc::now();
            self.persist();
        }
    }

    pub fn remove_completion(&mut self, id: Uuid) {
        self.completions.retain(|p| p.completion.id != id);
        self.persist();
    }

    pub fn remove_deletion(&mut self, id: Uuid) {
        self.deletions.retain(|p| p.id != id);
        self.persist();
    }

    pub fn completions(&self) -> &[PendingCompletion] {
        &self.completions
    }

    pub fn deletions(&self) -> &[PendingDeletion] {
        &self.deletions
    }

    pub fn is_empty(&self) -> bool {
        self.completions.is_empty() && self.deletions.is_empty()
    }

    fn persist(&self) {
        let snapshot = PendingSnapshot {
            completions: self.completions.clone(),
            deletions: self.deletions.clone(),
        };
        if let Err(e) = storage::save_snapshot(&self.path, &snapshot) {
            log::warn!("Pending queue persist failed: {}", e);
        }
    }
}
