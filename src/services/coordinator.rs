//! Sync rate limiting
//!
//! Several screens opportunistically request a sync when they appear. The
//! coordinator collapses those into at most one full sync per interval so a
//! quick tab-hop does not hammer the remote.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::cloud_sync::SyncManager;

pub struct SyncCoordinator {
    manager: Arc<SyncManager>,
    min_interval: Duration,
    last_sync: Mutex<Option<Instant>>,
}

impl SyncCoordinator {
    pub fn new(manager: Arc<SyncManager>, min_interval: Duration) -> Self {
        Self {
            manager,
            min_interval,
            last_sync: Mutex::new(None),
        }
    }

    /// True if no sync has run yet or the minimum interval has elapsed.
    pub fn should_sync(&self) -> bool {
        match *self.last_sync.lock() {
            None => true,
            Some(last) => last.elapsed() >= self.min_interval,
        }
    }

    /// Run a full sync unless one ran recently. Returns whether a sync was
    /// actually started. The interval is stamped before the network round
    /// trip so an overlapping request sees it and backs off.
    pub async fn perform_sync(&self) -> bool {
        {
            let mut last_sync = self.last_sync.lock();
            let gated = matches!(*last_sync, Some(last) if last.elapsed() < self.min_interval);
            if gated {
                log::debug!("Skipping sync, last run was under the minimum interval");
                return false;
            }
            *last_sync = Some(Instant::now());
        }

        self.manager.sync().await;
        true
    }

    /// Run a full sync regardless of the interval gate.
    pub async fn force_sync(&self) {
        *self.last_sync.lock() = Some(Instant::now());
        self.manager.sync().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::database::remote::common::SyncError;
    use crate::database::remote::ProgressRemote;
    use crate::models::completions::CompletionRecord;
    use crate::models::identity::Identity;
    use crate::models::progress::ProgressState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Remote that only counts progress fetches; everything else succeeds
    /// with empty data.
    #[derive(Default)]
    struct CountingRemote {
        fetch_progress_calls: AtomicUsize,
    }

    #[async_trait]
    impl ProgressRemote for CountingRemote {
        async fn fetch_progress(
            &self,
            identity: &Identity,
            _access_token: Option<&str>,
        ) -> Result<ProgressState, SyncError> {
            self.fetch_progress_calls.fetch_add(1, Ordering::SeqCst);
            Err(SyncError::NotFound(identity.filter()))
        }

        async fn update_progress(
            &self,
            _identity: &Identity,
            _state: &ProgressState,
            _access_token: Option<&str>,
        ) -> Result<(), SyncError> {
            Ok(())
        }

        async fn record_completion(
            &self,
            record: &CompletionRecord,
            _access_token: Option<&str>,
        ) -> Result<Uuid, SyncError> {
            Ok(record.id)
        }

        async fn fetch_recent_completions(
            &self,
            _identity: &Identity,
            _days: i64,
            _access_token: Option<&str>,
        ) -> Result<Vec<CompletionRecord>, SyncError> {
            Ok(Vec::new())
        }

        async fn soft_delete_completion(
            &self,
            _id: Uuid,
            _identity: &Identity,
            _access_token: Option<&str>,
        ) -> Result<(), SyncError> {
            Ok(())
        }
    }

    fn coordinator(
        dir: &std::path::Path,
        remote: &Arc<CountingRemote>,
        min_interval: Duration,
    ) -> SyncCoordinator {
        let config = SyncConfig {
            supabase_url: "http://localhost".to_string(),
            supabase_anon_key: "test-key".to_string(),
            ..SyncConfig::default()
        };
        let remote: Arc<dyn ProgressRemote> = remote.clone();
        let manager = Arc::new(SyncManager::with_data_dir(config, remote, dir));
        SyncCoordinator::new(manager, min_interval)
    }

    #[tokio::test]
    async fn test_second_sync_within_interval_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(CountingRemote::default());
        let coordinator = coordinator(dir.path(), &remote, Duration::from_secs(300));

        assert!(coordinator.should_sync());
        assert!(coordinator.perform_sync().await);
        assert!(!coordinator.should_sync());
        assert!(!coordinator.perform_sync().await);

        assert_eq!(remote.fetch_progress_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_racing_sync_requests_collapse_to_one_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(CountingRemote::default());
        let coordinator = coordinator(dir.path(), &remote, Duration::from_secs(300));

        // The interval is stamped before the network round trip, so the
        // overlapping request must see it and back off.
        let (first, second) = tokio::join!(coordinator.perform_sync(), coordinator.perform_sync());

        assert!(first != second);
        assert_eq!(remote.fetch_progress_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_sync_bypasses_interval_gate() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(CountingRemote::default());
        let coordinator = coordinator(dir.path(), &remote, Duration::from_secs(300));

        assert!(coordinator.perform_sync().await);
        coordinator.force_sync().await;

        assert_eq!(remote.fetch_progress_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sync_allowed_again_after_interval_elapses() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(CountingRemote::default());
        let coordinator = coordinator(dir.path(), &remote, Duration::from_millis(10));

        assert!(coordinator.perform_sync().await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(coordinator.should_sync());
        assert!(coordinator.perform_sync().await);

        assert_eq!(remote.fetch_progress_calls.load(Ordering::SeqCst), 2);
    }
}
