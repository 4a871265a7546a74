//! Message log, sync cursors, membership and identity engine for the mARC relay.
//!
//! Provides:
//! - `Relay` - The engine every transport calls into
//! - Storage implementations (memory, JSON file)

pub mod identity;
pub mod log;
mod membership;
pub mod outcome;
pub mod relay;
mod state;
pub mod storage;
pub mod sync;
mod topic;

pub use log::SearchQuery;
pub use outcome::{JoinOutcome, RenameOutcome, SyncBatch, Welcome};
pub use relay::Relay;
