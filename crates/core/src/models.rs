//! Domain model types shared by the resolver, the planner, and the engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source files
// ---------------------------------------------------------------------------

/// A file fetched from a gist. Gist filenames are flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution output
// ---------------------------------------------------------------------------

/// A source file paired with its normalized, repo-relative destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub source_name: String,
    pub destination: String,
}

impl ResolvedEntry {
    pub fn new(source_name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            destination: destination.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Write plan
// ---------------------------------------------------------------------------

/// A single file the commit step must write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub source_name: String,
    pub destination: String,
    pub content: Vec<u8>,
}

/// The computed, not-yet-executed writes and skips for one sync run.
///
/// Both lists follow resolved-entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    pub writes: Vec<PlannedWrite>,
    pub skipped: Vec<String>,
}

impl WritePlan {
    /// `true` iff at least one write is planned. The commit step is skipped
    /// entirely when this is `false`.
    pub fn has_changes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Destinations of all planned writes, in order.
    pub fn written_paths(&self) -> Vec<&str> {
        self.writes.iter().map(|w| w.destination.as_str()).collect()
    }
}
