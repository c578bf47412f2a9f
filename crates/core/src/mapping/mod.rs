//! Destination resolution for gist files.
//!
//! The mapping subsystem turns a flat list of gist filenames into
//! repo-relative destination paths:
//! 1. **Strategy** -- a closed set of mapping rules, validated at construction.
//! 2. **Path** -- joining and normalizing destinations, rejecting escapes.
//! 3. **Resolver** -- applying a strategy to a source set, rejecting collisions.

pub mod path;
pub mod resolver;
pub mod strategy;

pub use path::normalize_destination;
pub use resolver::{resolve, MappingResolver};
pub use strategy::{MappingStrategy, StrategyKind};
