pub mod cloud_sync;
pub mod coordinator;

pub use cloud_sync::SyncManager;
pub use coordinator::SyncCoordinator;
