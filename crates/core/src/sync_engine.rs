//! One-shot gist to repository synchronization.
//!
//! The [`SyncEngine`] drives a single run:
//!
//! 1. Fetch the gist's files.
//! 2. Resolve each file's destination under the mapping strategy.
//! 3. Plan writes and skips under the merge policy.
//! 4. Apply the writes, stage them, and commit only if the tree changed.
//! 5. Push the commit when configured to.
//!
//! Resolution failures abort the run before anything is written.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::commit_format::CommitFormatter;
use crate::config::{CommitConfig, CommitContext, DeliveryMode, SyncConfig};
use crate::errors::{ConfigError, SyncError};
use crate::gist::GistClient;
use crate::git::GitClient;
use crate::mapping::MappingResolver;
use crate::merge::MergePlanner;
use crate::models::SourceFile;
use crate::workspace::RepoTree;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a sync run ended up doing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SyncOutcome {
    /// The gist has no files.
    NoSourceFiles,
    /// No file survived the mapping strategy.
    NothingMapped,
    /// Every destination was skipped; nothing was written.
    Unchanged { skipped: Vec<String> },
    /// Files were written but the resulting tree equals `HEAD`.
    NoTreeChange { written: Vec<String> },
    /// A commit was created.
    Committed {
        sha: String,
        written: Vec<String>,
        skipped: Vec<String>,
        pushed: bool,
    },
}

impl SyncOutcome {
    pub fn committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSourceFiles => write!(f, "no files found in gist"),
            Self::NothingMapped => write!(f, "no files to sync after mapping"),
            Self::Unchanged { skipped } => {
                write!(f, "no files were modified ({} skipped)", skipped.len())
            }
            Self::NoTreeChange { written } => write!(
                f,
                "{} files copied, no changes to commit",
                written.len()
            ),
            Self::Committed {
                sha,
                written,
                skipped,
                pushed,
            } => write!(
                f,
                "committed {} ({} copied, {} skipped{})",
                sha,
                written.len(),
                skipped.len(),
                if *pushed { ", pushed" } else { "" }
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs gist syncs against one target repository.
pub struct SyncEngine {
    gist_id: String,
    resolver: MappingResolver,
    planner: MergePlanner,
    delivery: DeliveryMode,
    commit: CommitConfig,
    context: CommitContext,
    formatter: CommitFormatter,
    tree: RepoTree,
    gist_client: GistClient,
    git_client: GitClient,
}

impl SyncEngine {
    /// Build an engine from a validated configuration and its clients.
    pub fn new(
        config: &SyncConfig,
        gist_client: GistClient,
        git_client: GitClient,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!("initializing sync engine");
        Ok(Self {
            gist_id: config.gist.id.clone(),
            resolver: MappingResolver::new(config.mapping_strategy()?),
            planner: MergePlanner::new(config.merge_policy()?),
            delivery: config.delivery_mode(),
            commit: config.commit.clone(),
            context: config.context.clone(),
            formatter: CommitFormatter::new(config.commit.message.clone()),
            tree: RepoTree::new(git_client.repo_path()),
            gist_client,
            git_client,
        })
    }

    pub fn gist_id(&self) -> &str {
        &self.gist_id
    }

    pub fn git_client(&self) -> &GitClient {
        &self.git_client
    }

    // -----------------------------------------------------------------------
    // Main entry point
    // -----------------------------------------------------------------------

    /// Execute one full sync run.
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        info!(
            gist_id = %self.gist_id,
            mapping_strategy = %self.resolver.strategy().kind(),
            merge_strategy = %self.planner.policy(),
            target_path = self.resolver.strategy().target_path().unwrap_or("-"),
            delivery = %self.delivery,
            "starting gist sync"
        );
        self.check_delivery()?;

        let files = self.gist_client.fetch_files(&self.gist_id).await?;
        self.sync_files(&files)
    }

    /// Run everything after the fetch on already-retrieved files.
    pub fn sync_files(&self, files: &[SourceFile]) -> Result<SyncOutcome, SyncError> {
        self.check_delivery()?;

        if files.is_empty() {
            info!("no files found in gist, exiting");
            return Ok(SyncOutcome::NoSourceFiles);
        }

        let entries = self.resolver.resolve_sources(files)?;
        if entries.is_empty() {
            info!("no files to sync after mapping, exiting");
            return Ok(SyncOutcome::NothingMapped);
        }
        for entry in &entries {
            info!(source = %entry.source_name, destination = %entry.destination, "mapped");
        }

        let plan = self.planner.plan(&entries, files, &self.tree);
        for write in &plan.writes {
            info!(source = %write.source_name, destination = %write.destination, "copy");
        }
        for skipped in &plan.skipped {
            info!(destination = %skipped, "skipped, destination exists");
        }
        info!(
            copied = plan.writes.len(),
            skipped = plan.skipped.len(),
            "sync summary"
        );

        if !plan.has_changes() {
            info!("no files were modified, exiting");
            return Ok(SyncOutcome::Unchanged {
                skipped: plan.skipped,
            });
        }

        self.tree.apply(&plan)?;
        let written: Vec<String> = plan.writes.iter().map(|w| w.destination.clone()).collect();
        self.git_client.stage_paths(&plan.written_paths())?;

        if !self.git_client.has_staged_changes()? {
            info!("no changes detected, nothing to commit");
            return Ok(SyncOutcome::NoTreeChange { written });
        }

        let message = self.formatter.format(&self.gist_id, &self.context);
        let oid = self
            .git_client
            .commit(&message, &self.commit.user_name, &self.commit.user_email)?;
        info!(sha = %oid, message = %message, "committed changes");

        let pushed = if self.commit.push {
            let branch = self.git_client.current_branch()?;
            self.git_client
                .push(&self.commit.remote, &branch, self.commit.token.as_deref())?;
            info!(remote = %self.commit.remote, branch = %branch, "pushed changes to repository");
            true
        } else {
            false
        };

        Ok(SyncOutcome::Committed {
            sha: oid.to_string(),
            written,
            skipped: plan.skipped,
            pushed,
        })
    }

    fn check_delivery(&self) -> Result<(), SyncError> {
        match self.delivery {
            DeliveryMode::Direct => Ok(()),
            DeliveryMode::PullRequest => {
                warn!("pull request creation requested");
                Err(SyncError::Unimplemented("pull request creation"))
            }
        }
    }
}
