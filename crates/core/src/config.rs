//! Configuration for gistsync.
//!
//! A run is configured either from a TOML file ([`SyncConfig::load_from_file`])
//! or from GitHub Action style `INPUT_*` variables
//! ([`SyncConfig::from_action_env`]). Secrets in TOML are stored as `_env`
//! fields naming environment variables; they are resolved by
//! [`SyncConfig::resolve_env_vars`].
//!
//! Environment access goes through a lookup closure so that everything below
//! the CLI can be exercised without touching the process environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, MappingError};
use crate::mapping::strategy::{MappingStrategy, StrategyKind};
use crate::merge::MergePolicy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Source gist settings.
    pub gist: GistConfig,

    /// Destination mapping settings.
    #[serde(default)]
    pub mapping: MappingConfig,

    /// Merge behaviour for existing destinations.
    #[serde(default)]
    pub merge: MergeConfig,

    /// Commit and delivery settings.
    #[serde(default)]
    pub commit: CommitConfig,

    /// Target repository settings.
    #[serde(default)]
    pub repo: RepoConfig,

    /// Values for commit message placeholders (not serialized).
    #[serde(skip)]
    pub context: CommitContext,
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// Gist
// ---------------------------------------------------------------------------

/// Source gist configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistConfig {
    /// Gist identifier (the hash in the gist URL).
    pub id: String,

    /// Environment variable holding a token with gist read access.
    /// Public gists need none.
    #[serde(default)]
    pub token_env: Option<String>,

    /// GitHub API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Resolved token.
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Raw mapping settings; validated into a [`MappingStrategy`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// One of `same_names`, `explicit`, `prefix`, `all_to_directory`.
    #[serde(default = "default_mapping_strategy")]
    pub strategy: String,

    /// Directory the files land in (ignored by `explicit`).
    #[serde(default = "default_target_path")]
    pub target_path: String,

    /// Prefix stripped by the `prefix` strategy.
    #[serde(default)]
    pub file_prefix: String,

    /// Source name to destination path; required for `explicit`.
    #[serde(default)]
    pub file_mappings: Option<serde_json::Value>,
}

fn default_mapping_strategy() -> String {
    StrategyKind::SameNames.to_string()
}
fn default_target_path() -> String {
    "./".into()
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            strategy: default_mapping_strategy(),
            target_path: default_target_path(),
            file_prefix: String::new(),
            file_mappings: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merge policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// One of `overwrite`, `skip_existing` (`newer_only` is reserved).
    #[serde(default = "default_merge_strategy")]
    pub strategy: String,
}

fn default_merge_strategy() -> String {
    MergePolicy::Overwrite.to_string()
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            strategy: default_merge_strategy(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// How synced changes reach the repository.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Commit on the checked-out branch (and push).
    #[default]
    Direct,
    /// Reserved: open a pull request instead. Not implemented.
    PullRequest,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::PullRequest => write!(f, "pull_request"),
        }
    }
}

/// Commit message, author identity, and push settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitConfig {
    /// Message template. Placeholders: `{gist_id}`, `{actor}`, `{ref}`.
    #[serde(default = "default_commit_message")]
    pub message: String,

    /// Author and committer name.
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Author and committer email.
    #[serde(default = "default_user_email")]
    pub user_email: String,

    /// Open a pull request instead of committing directly (reserved).
    #[serde(default)]
    pub create_pr: bool,

    /// Push the new commit to `remote`.
    #[serde(default = "default_true")]
    pub push: bool,

    /// Remote to push to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Environment variable holding the token used for pushing.
    #[serde(default = "default_push_token_env")]
    pub token_env: Option<String>,

    /// Resolved push token.
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_commit_message() -> String {
    "Sync from Gist {gist_id}".into()
}
fn default_user_name() -> String {
    "github-actions[bot]".into()
}
fn default_user_email() -> String {
    "github-actions[bot]@users.noreply.github.com".into()
}
fn default_true() -> bool {
    true
}
fn default_remote() -> String {
    "origin".into()
}
fn default_push_token_env() -> Option<String> {
    Some("GITHUB_TOKEN".into())
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            message: default_commit_message(),
            user_name: default_user_name(),
            user_email: default_user_email(),
            create_pr: false,
            push: true,
            remote: default_remote(),
            token_env: default_push_token_env(),
            token: None,
        }
    }
}

/// Values substituted into the commit message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitContext {
    pub actor: String,
    pub git_ref: String,
}

impl Default for CommitContext {
    fn default() -> Self {
        Self {
            actor: "unknown".into(),
            git_ref: "unknown".into(),
        }
    }
}

impl CommitContext {
    /// Read `GITHUB_ACTOR` / `GITHUB_REF` through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            actor: non_empty(lookup("GITHUB_ACTOR")).unwrap_or(defaults.actor),
            git_ref: non_empty(lookup("GITHUB_REF")).unwrap_or(defaults.git_ref),
        }
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Target repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Path to the working tree of the target repository.
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl SyncConfig {
    /// Load a [`SyncConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Build a config from GitHub Action inputs read through `lookup`.
    ///
    /// `INPUT_GIST_ID` is required. The commit context is filled in as well,
    /// so the result needs no further env resolution.
    pub fn from_action_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| non_empty(lookup(name));

        let id = input("INPUT_GIST_ID").ok_or_else(|| ConfigError::EnvVarMissing {
            var: "INPUT_GIST_ID".into(),
            field: "gist.id".into(),
        })?;

        // Kept raw; only the explicit strategy parses it.
        let file_mappings = input("INPUT_FILE_MAPPINGS").map(serde_json::Value::String);

        let defaults = CommitConfig::default();
        let config = Self {
            log_level: input("INPUT_LOG_LEVEL").unwrap_or_else(default_log_level),
            gist: GistConfig {
                id,
                token_env: None,
                api_url: input("GITHUB_API_URL").unwrap_or_else(default_api_url),
                token: input("INPUT_GIST_TOKEN"),
            },
            mapping: MappingConfig {
                strategy: input("INPUT_MAPPING_STRATEGY").unwrap_or_else(default_mapping_strategy),
                target_path: input("INPUT_TARGET_PATH").unwrap_or_else(default_target_path),
                file_prefix: lookup("INPUT_FILE_PREFIX").unwrap_or_default(),
                file_mappings,
            },
            merge: MergeConfig {
                strategy: input("INPUT_MERGE_STRATEGY").unwrap_or_else(default_merge_strategy),
            },
            commit: CommitConfig {
                message: input("INPUT_COMMIT_MESSAGE").unwrap_or(defaults.message),
                user_name: input("INPUT_GIT_USER_NAME").unwrap_or(defaults.user_name),
                user_email: input("INPUT_GIT_USER_EMAIL").unwrap_or(defaults.user_email),
                create_pr: input("INPUT_CREATE_PR")
                    .map(|v| v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
                push: defaults.push,
                remote: defaults.remote,
                token_env: None,
                token: input("INPUT_GITHUB_TOKEN").or_else(|| input("GITHUB_TOKEN")),
            },
            repo: RepoConfig {
                path: input("GITHUB_WORKSPACE")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_repo_path),
            },
            context: CommitContext::from_lookup(&lookup),
        };

        debug!(gist_id = %config.gist.id, "configuration read from action inputs");
        Ok(config)
    }

    /// Resolve all `*_env` fields and the commit context from the process
    /// environment.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve all `*_env` fields and the commit context through `lookup`.
    ///
    /// Missing variables log a warning but do not fail: a public gist needs
    /// no token, and pushing may rely on other credentials.
    pub fn resolve_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        info!("resolving environment variable references in config");

        if let Some(ref env_name) = self.gist.token_env {
            self.gist.token = resolve_optional_env(&lookup, env_name, "gist.token_env");
        }
        if let Some(ref env_name) = self.commit.token_env {
            self.commit.token = resolve_optional_env(&lookup, env_name, "commit.token_env");
        }
        self.context = CommitContext::from_lookup(&lookup);

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    ///
    /// This also builds the mapping strategy, merge policy and delivery
    /// mode, so any invalid name or malformed `file_mappings` surfaces here,
    /// before anything is fetched or written.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gist.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gist.id".into(),
                detail: "gist id must not be empty".into(),
            });
        }
        if self.commit.user_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "commit.user_name".into(),
                detail: "commit author name must not be empty".into(),
            });
        }
        if self.commit.user_email.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "commit.user_email".into(),
                detail: "commit author email must not be empty".into(),
            });
        }
        if self.commit.push && self.commit.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "commit.remote".into(),
                detail: "remote must not be empty when push is enabled".into(),
            });
        }

        self.mapping_strategy()?;
        if self.merge_policy()? == MergePolicy::NewerOnly {
            warn!("merge strategy 'newer_only' is not implemented yet and behaves as 'overwrite'");
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the validated [`MappingStrategy`].
    pub fn mapping_strategy(&self) -> Result<MappingStrategy, MappingError> {
        let kind: StrategyKind = self.mapping.strategy.parse()?;
        let strategy = MappingStrategy::from_parts(
            kind,
            &self.mapping.target_path,
            &self.mapping.file_prefix,
            self.mapping.file_mappings.as_ref(),
        )?;
        if let MappingStrategy::Explicit { file_mappings } = &strategy {
            if file_mappings.is_empty() {
                warn!("explicit mapping strategy has an empty file_mappings table");
            }
        }
        Ok(strategy)
    }

    /// Parse the configured [`MergePolicy`].
    pub fn merge_policy(&self) -> Result<MergePolicy, ConfigError> {
        self.merge.strategy.parse()
    }

    /// The configured [`DeliveryMode`].
    pub fn delivery_mode(&self) -> DeliveryMode {
        if self.commit.create_pr {
            DeliveryMode::PullRequest
        } else {
            DeliveryMode::Direct
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env<F>(lookup: &F, env_name: &str, field: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(env_name) {
        Some(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Some(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        None => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
