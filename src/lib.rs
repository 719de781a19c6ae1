//! Offline-first progress sync core for the Limber stretching app.
//!
//! Completions are written to local JSON-backed stores first, so streaks and
//! minutes are correct even with no connectivity. A sync manager reconciles
//! the local stores against Supabase: failed remote writes land in a durable
//! pending queue and are retried on the next sync, and remote/local progress
//! aggregates are merged field-by-field rather than last-writer-wins.
//!
//! The host app builds everything explicitly at its composition root:
//!
//! ```no_run
//! use std::sync::Arc;
//! use limber_sync::{SyncConfig, SyncCoordinator, SyncManager};
//!
//! # fn main() -> Result<(), String> {
//! let config = SyncConfig::default();
//! let min_interval = config.min_sync_interval;
//! let manager = Arc::new(SyncManager::open(config)?);
//! let coordinator = SyncCoordinator::new(manager.clone(), min_interval);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod models;
pub mod services;

pub use config::SyncConfig;
pub use database::remote::common::SyncError;
pub use database::remote::{ProgressRemote, SupabaseRemote};
pub use models::{CompletionRecord, Identity, PendingCompletion, PendingDeletion, ProgressState, Session};
pub use services::{SyncCoordinator, SyncManager};
