//! gistsync core library.
//!
//! This crate provides the components for copying a gist's files into a git
//! repository: configuration, destination mapping, merge planning, the gist
//! API client, local git operations, and the sync engine that ties them
//! together.

pub mod commit_format;
pub mod config;
pub mod errors;
pub mod gist;
pub mod git;
pub mod mapping;
pub mod merge;
pub mod models;
pub mod sync_engine;
pub mod workspace;

// Re-exports for convenience.
pub use config::SyncConfig;
pub use mapping::{MappingResolver, MappingStrategy};
pub use merge::{MergePlanner, MergePolicy};
pub use models::{ResolvedEntry, SourceFile, WritePlan};
pub use sync_engine::{SyncEngine, SyncOutcome};
