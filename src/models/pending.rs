use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::completions::CompletionRecord;

/// A completion whose remote insert failed and is awaiting retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCompletion {
    pub completion: CompletionRecord,
    pub last_attempt: DateTime<Utc>,
    pub attempt_count: u32,
}

impl PendingCompletion {
    pub fn new(completion: CompletionRecord) -> Self {
        Self {
            completion,
            last_attempt: Utc::now(),
            attempt_count: 0,
        }
    }
}

/// A soft delete whose remote call failed and is awaiting retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDeletion {
    pub id: Uuid,
    pub last_attempt: DateTime<Utc>,
    pub attempt_count: u32,
}

impl PendingDeletion {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            last_attempt: Utc::now(),
            attempt_count: 0,
        }
    }
}
