//! Error types for the gistsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Sync runs
//! surface everything through [`SyncError`]; configuration problems come
//! back as [`ConfigError`] before a run starts.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Mapping errors
// ---------------------------------------------------------------------------

/// Errors from mapping-strategy validation and destination resolution.
///
/// All of these are deterministic: the same sources and strategy always
/// produce the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    /// Two source files resolved to the same destination path.
    #[error("source files '{first}' and '{second}' both resolve to '{destination}'")]
    DuplicateDestination {
        destination: String,
        first: String,
        second: String,
    },

    /// One destination would have to be both a file and a directory.
    #[error("destination '{nested}' for source file '{nested_source}' lies under '{file}', which is written from '{file_source}'")]
    NestedDestination {
        file: String,
        file_source: String,
        nested: String,
        nested_source: String,
    },

    /// A resolved path would leave the repository root.
    #[error("destination '{path}' for source file '{source_name}' escapes the repository root")]
    PathEscape { source_name: String, path: String },

    /// Strategy parameters are structurally invalid.
    #[error("invalid mapping configuration for '{field}': {detail}")]
    InvalidStrategyConfig { field: String, detail: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Mapping strategy parameters failed validation.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Gist API errors
// ---------------------------------------------------------------------------

/// Errors from the GitHub Gist REST API.
#[derive(Debug, Error)]
pub enum GistError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("gist HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The gist does not exist or is not visible with the given token.
    #[error("gist '{0}' not found")]
    NotFound(String),

    /// The API returned a non-success status code.
    #[error("gist API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("gist authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// JSON deserialization failure.
    #[error("gist response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// HEAD is detached or unborn, so there is no branch to push.
    #[error("no branch checked out: {0}")]
    NoBranch(String),

    /// Push was rejected (e.g. non-fast-forward).
    #[error("git push rejected for branch '{branch}': {detail}")]
    PushRejected { branch: String, detail: String },
}

// ---------------------------------------------------------------------------
// Sync engine errors
// ---------------------------------------------------------------------------

/// Errors from a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A reserved feature was requested.
    #[error("{0} is not implemented yet")]
    Unimplemented(&'static str),

    /// Destination resolution failed; nothing was written.
    #[error("sync mapping error: {0}")]
    MappingError(#[from] MappingError),

    /// Fetching the gist failed.
    #[error("sync gist error: {0}")]
    GistError(#[from] GistError),

    /// A git operation failed.
    #[error("sync Git error: {0}")]
    GitError(#[from] GitError),

    /// Writing a planned file failed.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
