//! Local Git repository operations via `git2`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use git2::{Cred, Oid, PushOptions, RemoteCallbacks, Repository, Signature};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitError;

/// High-level Git client wrapping a `git2::Repository`.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self {
            repo,
            repo_path: path.to_path_buf(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Stage the given repo-relative paths.
    #[instrument(skip(self, paths), fields(count = paths.len()))]
    pub fn stage_paths(&self, paths: &[&str]) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        debug!("staged paths");
        Ok(())
    }

    /// Whether the index tree differs from the tree of `HEAD`.
    ///
    /// On an unborn branch any staged entry counts as a change.
    pub fn has_staged_changes(&self) -> Result<bool, GitError> {
        let mut index = self.repo.index()?;
        let index_tree = index.write_tree()?;
        let head_tree = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree()?.id()),
            Err(_) => None,
        };
        let changed = match head_tree {
            Some(head_tree) => head_tree != index_tree,
            None => !index.is_empty(),
        };
        debug!(changed, "compared index with HEAD");
        Ok(changed)
    }

    /// Commit the current index on `HEAD` with the given identity as both
    /// author and committer.
    #[instrument(skip(self, message))]
    pub fn commit(&self, message: &str, name: &str, email: &str) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let signature = Signature::now(name, email)?;
        let parent_commit = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent_commit.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        info!(sha = %oid, "created commit");
        Ok(oid)
    }

    /// Short name of the checked-out branch.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::NoBranch(e.message().to_string()))?;
        if !head.is_branch() {
            return Err(GitError::NoBranch("HEAD is detached".into()));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| GitError::NoBranch("branch name is not valid UTF-8".into()))
    }

    /// Push a local branch to a remote.
    ///
    /// With a token, authenticates as `x-access-token`; otherwise falls back
    /// to the configured git credential helper.
    #[instrument(skip(self, token))]
    pub fn push(&self, remote_name: &str, branch: &str, token: Option<&str>) -> Result<(), GitError> {
        info!(remote = remote_name, branch, "pushing");
        let mut remote = self.repo.find_remote(remote_name)?;
        let git_config = self.repo.config()?;
        let mut callbacks = RemoteCallbacks::new();
        let token = token.map(str::to_string);
        callbacks.credentials(move |url, username, _allowed| match &token {
            Some(tok) => Cred::userpass_plaintext("x-access-token", tok),
            None => Cred::credential_helper(&git_config, url, username),
        });
        let push_error = Arc::new(Mutex::new(None::<String>));
        let push_error_clone = Arc::clone(&push_error);
        callbacks.push_update_reference(move |refname, status| {
            if let Some(msg) = status {
                warn!(refname, msg, "push rejected");
                if let Ok(mut slot) = push_error_clone.lock() {
                    *slot = Some(msg.to_string());
                }
            }
            Ok(())
        });
        let mut push_opts = PushOptions::new();
        push_opts.remote_callbacks(callbacks);
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        remote.push(&[&refspec], Some(&mut push_opts))?;
        let rejected = push_error.lock().ok().and_then(|mut slot| slot.take());
        if let Some(detail) = rejected {
            return Err(GitError::PushRejected {
                branch: branch.to_string(),
                detail,
            });
        }
        info!("push completed");
        Ok(())
    }

    /// Return the SHA of HEAD.
    pub fn get_head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        Ok(commit.id().to_string())
    }
}
