//! Local progress aggregate store
//!
//! Owns the streak/minutes transition rules. Every mutation persists the
//! full state synchronously so a force-quit right after a completion still
//! counts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local, Utc};

use super::storage;
use crate::models::progress::{fitness_day, fitness_day_utc, ProgressState};

const PROGRESS_FILE: &str = "progress.json";

pub struct LocalProgressStore {
    path: PathBuf,
    rollover_hour: u32,
    state: ProgressState,
}

impl LocalProgressStore {
    pub fn load(dir: &Path, rollover_hour: u32) -> Self {
        let path = dir.join(PROGRESS_FILE);
        let state = storage::load_snapshot(&path);
        Self {
            path,
            rollover_hour,
            state,
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn snapshot(&self) -> ProgressState {
        self.state.clone()
    }

    pub fn rollover_hour(&self) -> u32 {
        self.rollover_hour
    }

    /// Fold a just-finished routine into the aggregate.
    pub fn record_completion(&mut self, duration_minutes: u32) {
        self.record_completion_at(duration_minutes, Local::now());
    }

    /// Same as [`record_completion`](Self::record_completion) with an
    /// explicit clock, so day-boundary behavior is testable.
    pub fn record_completion_at(&mut self, duration_minutes: u32, now: DateTime<Local>) {
        let today = fitness_day(now, self.rollover_hour);

        match self.state.last_activity {
            None => {
                // First ever activity
                self.state.streak = 1;
                self.state.daily_minutes = duration_minutes;
            }
            Some(last) => {
                let last_day = fitness_day_utc(last, self.rollover_hour);
                let yesterday = today - Duration::days(1);

                if last_day == today {
                    // Another session in the same fitness day
                    self.state.daily_minutes += duration_minutes;
                } else if last_day == yesterday {
                    // Consecutive day extends the streak
                    self.state.streak += 1;
                    self.state.daily_minutes = duration_minutes;
                } else {
                    // Gap of two or more fitness days breaks the streak
                    self.state.streak = 1;
                    self.state.daily_minutes = duration_minutes;
                }
            }
        }

        self.state.total_minutes += duration_minutes;
        self.state.last_activity = Some(now.with_timezone(&Utc));
        self.persist();
    }

    /// Roll the aggregate back after a completion is deleted.
    ///
    /// Total minutes always shrink; daily minutes only if the deleted record
    /// falls in the current fitness day. The streak is deliberately left
    /// alone: deleting a past completion does not retroactively recompute
    /// streak continuity.
    pub fn rollback_completion(&mut self, duration_minutes: u32, completed_at: DateTime<Utc>) {
        self.rollback_completion_at(duration_minutes, completed_at, Local::now());
    }

    pub fn rollback_completion_at(
        &mut self,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
        now: DateTime<Local>,
    ) {
        self.state.total_minutes = self.state.total_minutes.saturating_sub(duration_minutes);

        let today = fitness_day(now, self.rollover_hour);
        if fitness_day_utc(completed_at, self.rollover_hour) == today {
            self.state.daily_minutes = self.state.daily_minutes.saturating_sub(duration_minutes);
        }
        self.persist();
    }

    /// Replace the whole aggregate with a merge result. Trusts the caller.
    pub fn overwrite(&mut self, state: ProgressState) {
        self.state = state;
        self.persist();
    }

    /// Zero today's minutes. Day-rollover maintenance for an app foregrounded
    /// after a gap with no completions.
    pub fn reset_daily(&mut self) {
        self.state.daily_minutes = 0;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = storage::save_snapshot(&self.path, &self.state) {
            log::warn!("Progress store persist failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store(dir: &Path) -> LocalProgressStore {
        LocalProgressStore::load(dir, crate::models::progress::DEFAULT_ROLLOVER_HOUR)
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_completion_starts_streak() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store.record_completion_at(10, noon(2025, 3, 10));

        assert_eq!(store.state().streak, 1);
        assert_eq!(store.state().daily_minutes, 10);
        assert_eq!(store.state().total_minutes, 10);
        assert!(store.state().last_activity.is_some());
    }

    #[test]
    fn test_same_day_accumulates_minutes_without_touching_streak() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store.record_completion_at(10, noon(2025, 3, 10));
        store.record_completion_at(7, Local.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap());
        store.record_completion_at(3, Local.with_ymd_and_hms(2025, 3, 10, 21, 0, 0).unwrap());

        assert_eq!(store.state().streak, 1);
        assert_eq!(store.state().daily_minutes, 20);
        assert_eq!(store.state().total_minutes, 20);
    }

    #[test]
    fn test_next_day_extends_streak_and_resets_daily() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store.record_completion_at(10, noon(2025, 3, 10));
        store.record_completion_at(5, noon(2025, 3, 11));

        assert_eq!(store.state().streak, 2);
        assert_eq!(store.state().daily_minutes, 5);
        assert_eq!(store.state().total_minutes, 15);
    }

    #[test]
    fn test_two_day_gap_breaks_streak() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store.record_completion_at(10, noon(2025, 3, 10));
        store.record_completion_at(5, noon(2025, 3, 11));
        store.record_completion_at(8, noon(2025, 3, 14));

        assert_eq!(store.state().streak, 1);
        assert_eq!(store.state().daily_minutes, 8);
        assert_eq!(store.state().total_minutes, 23);
    }

    #[test]
    fn test_early_morning_counts_toward_previous_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        // 23:00 on the 10th, then 01:30 "on the 11th" — same fitness day
        store.record_completion_at(10, Local.with_ymd_and_hms(2025, 3, 10, 23, 0, 0).unwrap());
        store.record_completion_at(5, Local.with_ymd_and_hms(2025, 3, 11, 1, 30, 0).unwrap());

        assert_eq!(store.state().streak, 1);
        assert_eq!(store.state().daily_minutes, 15);
    }

    #[test]
    fn test_rollback_today_reduces_daily_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        let now = noon(2025, 3, 10);
        store.record_completion_at(10, now);
        store.rollback_completion_at(10, now.with_timezone(&Utc), now);

        assert_eq!(store.state().daily_minutes, 0);
        assert_eq!(store.state().total_minutes, 0);
        assert_eq!(store.state().streak, 1);
    }

    #[test]
    fn test_rollback_past_day_reduces_only_total() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        let yesterday = noon(2025, 3, 10);
        let today = noon(2025, 3, 11);
        store.record_completion_at(10, yesterday);
        store.record_completion_at(5, today);
        store.rollback_completion_at(10, yesterday.with_timezone(&Utc), today);

        assert_eq!(store.state().total_minutes, 5);
        assert_eq!(store.state().daily_minutes, 5);
    }

    #[test]
    fn test_rollback_clamps_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        let now = noon(2025, 3, 10);
        store.record_completion_at(3, now);
        store.rollback_completion_at(10, now.with_timezone(&Utc), now);

        assert_eq!(store.state().daily_minutes, 0);
        assert_eq!(store.state().total_minutes, 0);
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store(dir.path());
            store.record_completion_at(12, noon(2025, 3, 10));
        }
        let reloaded = store(dir.path());
        assert_eq!(reloaded.state().total_minutes, 12);
        assert_eq!(reloaded.state().streak, 1);
    }

    #[test]
    fn test_reset_daily_zeroes_only_daily() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store(dir.path());

        store.record_completion_at(10, noon(2025, 3, 10));
        store.reset_daily();

        assert_eq!(store.state().daily_minutes, 0);
        assert_eq!(store.state().total_minutes, 10);
        assert_eq!(store.state().streak, 1);
    }
}
