pub mod completions;
pub mod identity;
pub mod pending;
pub mod progress;

pub use completions::CompletionRecord;
pub use identity::{Identity, Session};
pub use pending::{PendingCompletion, PendingDeletion};
pub use progress::ProgressState;
