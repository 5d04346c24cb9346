//! Commit and push cycle for a single working tree.
//!
//! [`SyncOrchestrator`] reads the repository state, commits when the tree
//! is dirty and pushes when the branch is ahead. The token only exists on
//! disk while the push runs.

mod error;
mod identity;
mod lock;
mod orchestrator;
mod secret_file;

pub use error::{Result, SyncError};
pub use identity::Identity;
pub use orchestrator::{PushOptions, PushOutcome, SyncOrchestrator, SyncSettings};
pub use secret_file::SecretBridge;
