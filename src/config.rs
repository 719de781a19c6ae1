//! Sync configuration
//!
//! Defaults point at the production Supabase project; tests and staging
//! builds construct their own config.

use std::time::Duration;

use crate::models::progress::DEFAULT_ROLLOVER_HOUR;

const SUPABASE_URL: &str = "https://xjrvmqahqyophfzvtesm.supabase.co";
const SUPABASE_ANON_KEY: &str = "sb_publishable_Kd2mVqLw8jRfGhUxPnTyAw_c3kpqzXn";

/// How many days of remote completions a pull replaces the local log with.
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Minimum gap between opportunistic full syncs.
const DEFAULT_MIN_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Local hour at which the fitness day rolls over (0-23)
    pub rollover_hour: u32,
    pub lookback_days: i64,
    pub min_sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            supabase_url: SUPABASE_URL.to_string(),
            supabase_anon_key: SUPABASE_ANON_KEY.to_string(),
            rollover_hour: DEFAULT_ROLLOVER_HOUR,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_sync_interval: DEFAULT_MIN_SYNC_INTERVAL,
        }
    }
}
