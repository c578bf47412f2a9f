//! The target working tree on disk.
//!
//! [`RepoTree`] answers existence queries for the merge planner and executes
//! a [`WritePlan`]. Skipped entries are never touched.
//!
//! Destinations are already lexically confined to the root. Symlinks inside
//! the tree could still point anywhere, so no write may pass through one.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{MappingError, SyncError};
use crate::merge::DestinationState;
use crate::models::WritePlan;

/// A repository working tree rooted at `root`.
#[derive(Debug, Clone)]
pub struct RepoTree {
    root: PathBuf,
}

impl RepoTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a repo-relative destination.
    pub fn full_path(&self, destination: &str) -> PathBuf {
        self.root.join(destination)
    }

    /// Fail with `PathEscape` if `destination` or any of its ancestors
    /// below the root is a symlink.
    pub fn check_no_symlinks(&self, source_name: &str, destination: &str) -> Result<(), MappingError> {
        let mut current = self.root.clone();
        for segment in destination.split('/') {
            current.push(segment);
            match std::fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    warn!(destination, link = %current.display(), "destination passes through a symlink");
                    return Err(MappingError::PathEscape {
                        source_name: source_name.to_string(),
                        path: destination.to_string(),
                    });
                }
                Ok(_) => {}
                // Nothing below a missing entry can be a symlink yet.
                Err(_) => break,
            }
        }
        Ok(())
    }

    /// Write every planned file, creating parent directories as needed.
    ///
    /// All destinations are checked before the first write.
    pub fn apply(&self, plan: &WritePlan) -> Result<(), SyncError> {
        for write in &plan.writes {
            self.check_no_symlinks(&write.source_name, &write.destination)?;
        }
        for write in &plan.writes {
            let target = self.full_path(&write.destination);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| SyncError::WriteFailed {
                    path: write.destination.clone(),
                    source,
                })?;
            }
            std::fs::write(&target, &write.content).map_err(|source| SyncError::WriteFailed {
                path: write.destination.clone(),
                source,
            })?;
            debug!(destination = %write.destination, bytes = write.content.len(), "wrote file");
        }
        info!(count = plan.writes.len(), "applied write plan");
        Ok(())
    }
}

impl DestinationState for RepoTree {
    /// A dangling symlink counts as present.
    fn exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(self.full_path(path)).is_ok()
    }
}
