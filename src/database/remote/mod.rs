// Remote database operations for Supabase cloud sync
//
// All operations use the Supabase REST API (PostgREST). The remote is
// treated as unreliable: every call can fail, and the sync manager is
// responsible for queueing failed writes for retry.
//
// `ProgressRemote` is the seam the sync manager talks through, so tests can
// substitute an in-memory remote.

pub mod common;
pub mod completions;
pub mod progress;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::completions::CompletionRecord;
use crate::models::identity::Identity;
use crate::models::progress::ProgressState;
use common::{SupabaseClient, SyncError};

#[async_trait]
pub trait ProgressRemote: Send + Sync {
    /// Fetch the progress row for an identity. Fails if none exists.
    async fn fetch_progress(
        &self,
        identity: &Identity,
        access_token: Option<&str>,
    ) -> Result<ProgressState, SyncError>;

    /// Upsert the full progress aggregate for an identity.
    async fn update_progress(
        &self,
        identity: &Identity,
        state: &ProgressState,
        access_token: Option<&str>,
    ) -> Result<(), SyncError>;

    /// Insert a completion; idempotent on the record's id.
    async fn record_completion(
        &self,
        record: &CompletionRecord,
        access_token: Option<&str>,
    ) -> Result<Uuid, SyncError>;

    /// Fetch an identity's non-deleted completions from the last `days` days.
    async fn fetch_recent_completions(
        &self,
        identity: &Identity,
        days: i64,
        access_token: Option<&str>,
    ) -> Result<Vec<CompletionRecord>, SyncError>;

    /// Soft-delete a completion by id.
    async fn soft_delete_completion(
        &self,
        id: Uuid,
        identity: &Identity,
        access_token: Option<&str>,
    ) -> Result<(), SyncError>;
}

/// Production remote backed by the Supabase REST API.
pub struct SupabaseRemote {
    client: SupabaseClient,
}

impl SupabaseRemote {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: SupabaseClient::new(base_url, anon_key),
        }
    }
}

#[async_trait]
impl ProgressRemote for SupabaseRemote {
    async fn fetch_progress(
        &self,
        identity: &Identity,
        access_token: Option<&str>,
    ) -> Result<ProgressState, SyncError> {
        progress::fetch_progress(&self.client, identity, access_token).await
    }

    async fn update_progress(
        &self,
        identity: &Identity,
        state: &ProgressState,
        access_token: Option<&str>,
    ) -> Result<(), SyncError> {
        progress::upsert_progress(&self.client, identity, state, access_token).await
    }

    async fn record_completion(
        &self,
        record: &CompletionRecord,
        access_token: Option<&str>,
    ) -> Result<Uuid, SyncError> {
        completions::record_completion(&self.client, record, access_token).await
    }

    async fn fetch_recent_completions(
        &self,
        identity: &Identity,
        days: i64,
        access_token: Option<&str>,
    ) -> Result<Vec<CompletionRecord>, SyncError> {
        completions::fetch_recent_completions(&self.client, identity, days, access_token).await
    }

    async fn soft_delete_completion(
        &self,
        id: Uuid,
        identity: &Identity,
        access_token: Option<&str>,
    ) -> Result<(), SyncError> {
        completions::soft_delete_completion(&self.client, id, identity, access_token).await
    }
}
