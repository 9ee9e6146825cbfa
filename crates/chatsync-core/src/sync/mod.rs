//! Save and refresh orchestration.

pub mod coordinator;
pub mod save;

pub use coordinator::SyncCoordinator;
pub use save::{SaveOutcome, SaveState};
