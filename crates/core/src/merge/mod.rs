//! Merge planning: deciding which resolved entries to write and which to
//! leave untouched.

pub mod planner;
pub mod policy;

pub use planner::{plan_writes, DestinationState, MergePlanner};
pub use policy::MergePolicy;
