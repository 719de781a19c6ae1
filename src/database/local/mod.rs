//! Local durable stores
//!
//! Three independent JSON snapshot files in the app data directory:
//! progress aggregate, completion log, pending-operation queue. Every
//! mutation rewrites the whole file; at tens-to-hundreds of records per
//! user that is cheap and keeps each file a consistent snapshot.
//!
//! File I/O here is synchronous on purpose. A write failure is logged and
//! the in-memory state stays authoritative for the running process.

pub mod completions;
pub mod device;
pub mod pending;
pub mod progress;
pub mod storage;

pub use completions::CompletionLogStore;
pub use pending::PendingQueue;
pub use progress::LocalProgressStore;
