//! Cascade detection, application, and completion cleanup.

pub mod cleanup;
pub mod service;

pub use cleanup::{CleanupResult, CompletionCleanupService};
pub use service::{AppliedCascade, CascadeEvent, CascadeEventKind, CascadeService, UnblockedTask};
