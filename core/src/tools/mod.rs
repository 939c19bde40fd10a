//! Write-path tools built on top of the repository/status/cascade layers.

pub mod locking;
pub mod manage_container;

pub use locking::{HeldLocks, LockRegistry};
