//! Test utilities shared across the workspace's crates: fluent builders for
//! every entity kind, fixture helpers for common scenarios (a feature with a
//! mix of terminal/non-terminal tasks, a chain of blocking dependencies),
//! `fake`/`proptest`-backed random data generation, and error-injecting fake
//! repositories for exercising the engine's failure paths.

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod generators;
pub mod repository;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
pub use repository::{FakeDependencyRepository, FakeFeatureRepository, FakeProjectRepository, FakeTaskRepository};
