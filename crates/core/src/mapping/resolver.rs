//! Applies a [`MappingStrategy`] to a set of gist filenames.
//!
//! Resolution is pure: the same names and strategy always produce the same
//! entries in the same (input) order, whatever the repository looks like.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::errors::MappingError;
use crate::mapping::path::{join_destination, normalize_destination};
use crate::mapping::strategy::MappingStrategy;
use crate::models::{ResolvedEntry, SourceFile};

/// Resolves gist filenames to repo-relative destinations.
#[derive(Debug, Clone)]
pub struct MappingResolver {
    strategy: MappingStrategy,
}

impl MappingResolver {
    pub fn new(strategy: MappingStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &MappingStrategy {
        &self.strategy
    }

    /// Resolve every name under the active strategy.
    ///
    /// Fails as a whole on the first escape, duplicate destination, or
    /// destination nested under another file's destination; no partial
    /// result is returned.
    pub fn resolve<I, S>(&self, source_names: I) -> Result<Vec<ResolvedEntry>, MappingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = source_names.into_iter().collect();
        let mut entries = Vec::with_capacity(names.len());
        let mut claimed: HashMap<String, String> = HashMap::new();

        for name in &names {
            let name = name.as_ref();
            let Some(raw) = self.raw_destination(name) else {
                warn!(source = name, "no mapping found, skipping");
                continue;
            };
            let destination = normalize_destination(name, &raw)?;

            if let Some(first) = claimed.get(&destination) {
                return Err(MappingError::DuplicateDestination {
                    destination,
                    first: first.clone(),
                    second: name.to_string(),
                });
            }
            claimed.insert(destination.clone(), name.to_string());

            debug!(source = name, destination = %destination, "resolved destination");
            entries.push(ResolvedEntry::new(name, destination));
        }

        for entry in &entries {
            let dest = entry.destination.as_str();
            for (idx, _) in dest.match_indices('/') {
                if let Some(file_source) = claimed.get(&dest[..idx]) {
                    return Err(MappingError::NestedDestination {
                        file: dest[..idx].to_string(),
                        file_source: file_source.clone(),
                        nested: dest.to_string(),
                        nested_source: entry.source_name.clone(),
                    });
                }
            }
        }

        if let MappingStrategy::Explicit { file_mappings } = &self.strategy {
            for key in file_mappings.keys() {
                if !names.iter().any(|n| n.as_ref() == key.as_str()) {
                    debug!(source = key.as_str(), "mapped file not present in gist, dropped");
                }
            }
        }

        info!(
            strategy = %self.strategy.kind(),
            count = entries.len(),
            "mapping strategy created mappings"
        );
        Ok(entries)
    }

    /// Convenience wrapper over [`resolve`](Self::resolve) for fetched files.
    pub fn resolve_sources(&self, sources: &[SourceFile]) -> Result<Vec<ResolvedEntry>, MappingError> {
        self.resolve(sources.iter().map(|s| s.name.as_str()))
    }

    /// Un-normalized destination for `name`, or `None` when the strategy
    /// drops the file.
    fn raw_destination(&self, name: &str) -> Option<String> {
        match &self.strategy {
            MappingStrategy::SameNames { target_path }
            | MappingStrategy::AllToDirectory { target_path } => {
                Some(join_destination(target_path, name))
            }
            MappingStrategy::Explicit { file_mappings } => file_mappings.get(name).cloned(),
            MappingStrategy::Prefix {
                target_path,
                prefix,
            } => {
                let renamed = match name.strip_prefix(prefix.as_str()) {
                    Some(rest) if !prefix.is_empty() && !rest.is_empty() => rest,
                    _ => name,
                };
                Some(join_destination(target_path, renamed))
            }
        }
    }
}

/// Resolve `source_names` under `strategy`. Shorthand for
/// [`MappingResolver::resolve`].
pub fn resolve<I, S>(source_names: I, strategy: &MappingStrategy) -> Result<Vec<ResolvedEntry>, MappingError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    MappingResolver::new(strategy.clone()).resolve(source_names)
}
