//! Cloud sync orchestration service
//!
//! Single authority for reconciling the local stores against Supabase:
//! 1. Drains the pending-operation queue (failed writes awaiting retry)
//! 2. Pulls the remote progress row and merges it field-by-field
//! 3. Replaces the local completion log with the remote's recent window
//! 4. Pushes the merged aggregate back up for signed-in users
//!
//! Remote failures never escape the public entry points; they are recorded
//! in `last_sync_error` and the device keeps running on local data until a
//! later sync catches the remote up.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::database::local::{
    device, storage, CompletionLogStore, LocalProgressStore, PendingQueue,
};
use crate::database::remote::{ProgressRemote, SupabaseRemote};
use crate::models::completions::CompletionRecord;
use crate::models::identity::{Identity, Session};
use crate::models::pending::{PendingCompletion, PendingDeletion};
use crate::models::progress::{fitness_day, fitness_day_utc, ProgressState};

// ============================================================================
// Merge
// ============================================================================

/// Field-wise merge of the local and remote progress aggregates.
///
/// Streak, total minutes and last activity each take the larger/newer side.
/// Daily minutes only move to the remote value when the remote was active in
/// the current fitness day and counted more than we did; a stale remote day
/// must not clobber today's local minutes.
fn merge_progress(
    local: &ProgressState,
    remote: &ProgressState,
    now: DateTime<Local>,
    rollover_hour: u32,
) -> ProgressState {
    let daily_minutes = match remote.last_activity {
        Some(remote_last)
            if fitness_day_utc(remote_last, rollover_hour) == fitness_day(now, rollover_hour)
                && remote.daily_minutes > local.daily_minutes =>
        {
            remote.daily_minutes
        }
        _ => local.daily_minutes,
    };

    let last_activity = match (local.last_activity, remote.last_activity) {
        (Some(ours), Some(theirs)) => Some(ours.max(theirs)),
        (ours, theirs) => ours.or(theirs),
    };

    ProgressState {
        streak: local.streak.max(remote.streak),
        daily_minutes,
        total_minutes: local.total_minutes.max(remote.total_minutes),
        last_activity,
    }
}

// ============================================================================
// Sync Manager
// ============================================================================

pub struct SyncManager {
    config: SyncConfig,
    remote: Arc<dyn ProgressRemote>,
    progress: Mutex<LocalProgressStore>,
    log: Mutex<CompletionLogStore>,
    pending: Mutex<PendingQueue>,
    session: Mutex<Option<Session>>,
    device_id: Uuid,
    /// Non-reentrant guard: a sync requested while one is in flight is
    /// dropped, not queued. Callers must not assume their request ran.
    is_syncing: AtomicBool,
    /// Set after the first accepted pull. Until then the local aggregate may
    /// be a freshly-zeroed cache, and pushing it would clobber the remote.
    has_fetched_initial_progress: AtomicBool,
    last_sync_error: Mutex<Option<String>>,
}

impl SyncManager {
    /// Build a manager over stores in `dir`. The composition root owns the
    /// lifetime; there is no shared singleton.
    pub fn with_data_dir(config: SyncConfig, remote: Arc<dyn ProgressRemote>, dir: &Path) -> Self {
        let progress = LocalProgressStore::load(dir, config.rollover_hour);
        let log = CompletionLogStore::load(dir);
        let pending = PendingQueue::load(dir);
        let device_id = device::load_or_create_device_id(dir);

        Self {
            config,
            remote,
            progress: Mutex::new(progress),
            log: Mutex::new(log),
            pending: Mutex::new(pending),
            session: Mutex::new(None),
            device_id,
            is_syncing: AtomicBool::new(false),
            has_fetched_initial_progress: AtomicBool::new(false),
            last_sync_error: Mutex::new(None),
        }
    }

    /// Production manager: Supabase remote, platform data directory.
    pub fn open(config: SyncConfig) -> Result<Self, String> {
        let dir = storage::default_data_dir()?;
        let remote = Arc::new(SupabaseRemote::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        ));
        Ok(Self::with_data_dir(config, remote, &dir))
    }

    // ========================================================================
    // Session / identity
    // ========================================================================

    pub fn set_session(&self, session: Option<Session>) {
        *self.session.lock() = session;
    }

    fn identity(&self) -> Identity {
        match self.session.lock().as_ref() {
            Some(session) => Identity::User(session.user_id),
            None => Identity::Device(self.device_id),
        }
    }

    fn access_token(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.access_token.clone())
    }

    pub fn device_id(&self) -> Uuid {
        self.device_id
    }

    // ========================================================================
    // Local reads
    // ========================================================================

    pub fn progress_state(&self) -> ProgressState {
        self.progress.lock().snapshot()
    }

    pub fn recent_completions(&self, days: i64) -> Vec<CompletionRecord> {
        self.log.lock().recent(days)
    }

    pub fn pending_completions(&self) -> Vec<PendingCompletion> {
        self.pending.lock().completions().to_vec()
    }

    pub fn pending_deletions(&self) -> Vec<PendingDeletion> {
        self.pending.lock().deletions().to_vec()
    }

    pub fn last_sync_error(&self) -> Option<String> {
        self.last_sync_error.lock().clone()
    }

    pub fn has_fetched_initial_progress(&self) -> bool {
        self.has_fetched_initial_progress.load(Ordering::SeqCst)
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Record a finished routine: local log and aggregate first, remote
    /// best-effort. A failed remote insert lands in the pending queue.
    pub async fn record_completion(
        &self,
        routine_id: &str,
        duration_minutes: u32,
    ) -> CompletionRecord {
        let record =
            CompletionRecord::new(self.identity(), routine_id, duration_minutes, Utc::now());

        self.log.lock().append(record.clone());
        self.progress.lock().record_completion(duration_minutes);

        let token = self.access_token();
        if let Err(e) = self
            .remote
            .record_completion(&record, token.as_deref())
            .await
        {
            log::warn!("Remote completion insert failed, queueing retry: {}", e);
            self.pending.lock().add_completion(record.clone());
        }

        record
    }

    /// Delete a completion. Local removal and aggregate rollback happen
    /// immediately; the remote soft delete is retried via the pending queue
    /// if it fails. Returns false if the id is unknown locally.
    pub async fn delete_completion(&self, id: Uuid) -> bool {
        let Some(record) = self.log.lock().remove(id) else {
            return false;
        };

        // The insert may still be queued from an offline attempt; purge it
        // so a later drain cannot re-create the deleted row.
        self.pending.lock().remove_completion(id);

        self.progress
            .lock()
            .rollback_completion(record.duration_minutes, record.completed_at);

        let identity = self.identity();
        let token = self.access_token();
        if let Err(e) = self
            .remote
            .soft_delete_completion(id, &identity, token.as_deref())
            .await
        {
            log::warn!("Remote soft delete failed, queueing retry: {}", e);
            self.pending.lock().add_deletion(id);
        }

        true
    }

    /// Zero today's minutes if the last activity was in a previous fitness
    /// day. Called when the app foregrounds after a gap with no completions.
    pub fn reset_daily_if_stale(&self) {
        let mut progress = self.progress.lock();
        let Some(last) = progress.state().last_activity else {
            return;
        };
        let rollover = progress.rollover_hour();
        if fitness_day_utc(last, rollover) != fitness_day(Local::now(), rollover)
            && progress.state().daily_minutes > 0
        {
            progress.reset_daily();
        }
    }

    // ========================================================================
    // Sync entry points
    // ========================================================================

    /// Full bidirectional sync: pull, merge, then push.
    pub async fn sync(&self) {
        if !self.begin_sync() {
            log::debug!("Sync already in flight, dropping request");
            return;
        }
        *self.last_sync_error.lock() = None;
        self.pull_inner().await;
        self.push_inner().await;
        self.end_sync();
    }

    /// Pull-only sync: drain pending, fetch remote progress and completions,
    /// merge into the local stores.
    pub async fn sync_supabase_to_local(&self) {
        if !self.begin_sync() {
            log::debug!("Sync already in flight, dropping pull request");
            return;
        }
        self.pull_inner().await;
        self.end_sync();
    }

    /// Push-only sync: drain pending, then write the local aggregate up.
    pub async fn sync_local_to_supabase(&self) {
        if !self.begin_sync() {
            log::debug!("Sync already in flight, dropping push request");
            return;
        }
        self.push_inner().await;
        self.end_sync();
    }

    fn begin_sync(&self) -> bool {
        self.is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn end_sync(&self) {
        self.is_syncing.store(false, Ordering::SeqCst);
    }

    // ========================================================================
    // Pull
    // ========================================================================

    async fn pull_inner(&self) {
        self.drain_pending().await;

        let identity = self.identity();
        let token = self.access_token();

        let remote_state = match self
            .remote
            .fetch_progress(&identity, token.as_deref())
            .await
        {
            Ok(state) => state,
            Err(e) => {
                self.record_error("pull progress", &e);
                return;
            }
        };

        // First-pull acceptance gate: a zero-minute row is indistinguishable
        // from an uninitialized placeholder, so the very first pull only
        // counts when the remote has real minutes for today.
        if !self.has_fetched_initial_progress() && remote_state.daily_minutes == 0 {
            log::info!("Ignoring first remote progress pull with zero daily minutes");
            return;
        }

        // Fetch everything before writing anything, so local stores are
        // never left mid-update across a network call.
        let remote_log = self
            .remote
            .fetch_recent_completions(&identity, self.config.lookback_days, token.as_deref())
            .await;

        // Merge against the local state only after the last await, under one
        // lock, so a completion recorded mid-pull still lands in the merged
        // aggregate.
        {
            let mut progress = self.progress.lock();
            let merged = merge_progress(
                progress.state(),
                &remote_state,
                Local::now(),
                progress.rollover_hour(),
            );
            progress.overwrite(merged);
        }
        self.has_fetched_initial_progress
            .store(true, Ordering::SeqCst);

        match remote_log {
            Ok(records) => {
                // Wholesale replacement: local-only completions are covered
                // by the pending queue, not by log merging.
                self.log.lock().replace_all(records);
            }
            Err(e) => {
                self.record_error("pull completions", &e);
            }
        }
    }

    // ========================================================================
    // Push
    // ========================================================================

    async fn push_inner(&self) {
        self.drain_pending().await;

        if !self.has_fetched_initial_progress() {
            log::debug!("Skipping progress push before first accepted pull");
            return;
        }

        // Anonymous devices never push the aggregate; their completions
        // still reach the remote individually.
        let Some(session) = self.session.lock().clone() else {
            log::debug!("No session, skipping progress push");
            return;
        };

        let state = self.progress.lock().snapshot();
        let identity = Identity::User(session.user_id);
        if let Err(e) = self
            .remote
            .update_progress(&identity, &state, Some(&session.access_token))
            .await
        {
            self.record_error("push progress", &e);
        }
    }

    // ========================================================================
    // Pending queue drain
    // ========================================================================

    /// Retry every queued write once. Runs at the start of both push and
    /// pull so resolved completions are in the aggregate before it is
    /// compared or pushed.
    async fn drain_pending(&self) {
        let identity = self.identity();
        let token = self.access_token();

        let queued = self.pending.lock().completions().to_vec();
        for entry in queued {
            let id = entry.completion.id;
            match self
                .remote
                .record_completion(&entry.completion, token.as_deref())
                .await
            {
                Ok(_) => self.pending.lock().remove_completion(id),
                Err(e) => {
                    log::warn!("Pending completion retry failed: {}", e);
                    self.pending.lock().update_attempt(id);
                }
            }
        }

        let queued = self.pending.lock().deletions().to_vec();
        for entry in queued {
            match self
                .remote
                .soft_delete_completion(entry.id, &identity, token.as_deref())
                .await
            {
                Ok(_) => self.pending.lock().remove_deletion(entry.id),
                Err(e) => {
                    log::warn!("Pending deletion retry failed: {}", e);
                    self.pending.lock().update_deletion_attempt(entry.id);
                }
            }
        }
    }

    fn record_error(&self, context: &str, e: &dyn std::fmt::Display) {
        let message = format!("{}: {}", context, e);
        log::warn!("Sync failure ({})", message);
        *self.last_sync_error.lock() = Some(message);
    }
}

// ============================================================================
// Tests
// ============================================================================
