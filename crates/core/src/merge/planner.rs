//! Turns resolved entries into a [`WritePlan`].
//!
//! # Decision model
//!
//! | Destination | Policy | Decision |
//! |-------------|--------|----------|
//! | absent | any | write |
//! | present | `overwrite` | write |
//! | present | `skip_existing` | skip |
//! | present | `newer_only` | write (reserved, warns) |
//!
//! The planner only reads destination state; it never writes, and it has no
//! failure modes of its own.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::merge::policy::MergePolicy;
use crate::models::{PlannedWrite, ResolvedEntry, SourceFile, WritePlan};

/// Read-only view of the target tree.
pub trait DestinationState {
    /// Whether a file already exists at the repo-relative `path`.
    fn exists(&self, path: &str) -> bool;
}

impl<F> DestinationState for F
where
    F: Fn(&str) -> bool,
{
    fn exists(&self, path: &str) -> bool {
        self(path)
    }
}

/// Applies a [`MergePolicy`] to resolved entries.
#[derive(Debug, Clone, Copy)]
pub struct MergePlanner {
    policy: MergePolicy,
}

impl MergePlanner {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Build the write plan for `entries`, in entry order.
    ///
    /// `sources` supplies content by name. An entry whose source is missing
    /// is ignored with a warning.
    pub fn plan<D>(&self, entries: &[ResolvedEntry], sources: &[SourceFile], state: &D) -> WritePlan
    where
        D: DestinationState + ?Sized,
    {
        let by_name: HashMap<&str, &SourceFile> =
            sources.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut plan = WritePlan::default();

        for entry in entries {
            let Some(source) = by_name.get(entry.source_name.as_str()) else {
                warn!(source = %entry.source_name, "resolved entry has no source content, ignoring");
                continue;
            };

            if self.should_write(&entry.destination, state) {
                plan.writes.push(PlannedWrite {
                    source_name: entry.source_name.clone(),
                    destination: entry.destination.clone(),
                    content: source.content.clone(),
                });
            } else {
                plan.skipped.push(entry.destination.clone());
            }
        }

        info!(
            writes = plan.writes.len(),
            skipped = plan.skipped.len(),
            policy = %self.policy,
            "write plan computed"
        );
        plan
    }

    fn should_write<D>(&self, destination: &str, state: &D) -> bool
    where
        D: DestinationState + ?Sized,
    {
        if !state.exists(destination) {
            debug!(destination, "destination does not exist");
            return true;
        }

        match self.policy {
            MergePolicy::Overwrite => {
                debug!(destination, "destination exists, overwriting");
                true
            }
            MergePolicy::SkipExisting => {
                debug!(destination, "destination exists, skipping");
                false
            }
            MergePolicy::NewerOnly => {
                warn!(destination, "newer_only merge strategy not yet implemented, using overwrite");
                true
            }
        }
    }
}

/// Plan `entries` under `policy`. Shorthand for [`MergePlanner::plan`].
pub fn plan_writes<D>(
    entries: &[ResolvedEntry],
    sources: &[SourceFile],
    state: &D,
    policy: MergePolicy,
) -> WritePlan
where
    D: DestinationState + ?Sized,
{
    MergePlanner::new(policy).plan(entries, sources, state)
}
