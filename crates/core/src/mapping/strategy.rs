//! Mapping strategies.
//!
//! Strategy names coming from configuration parse into the closed
//! [`StrategyKind`] enum; [`MappingStrategy::from_parts`] then validates the
//! parameters each variant needs. Unknown names never reach the resolver.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MappingError;

/// Default target directory: the repository root.
pub const DEFAULT_TARGET_PATH: &str = "./";

// ---------------------------------------------------------------------------
// Strategy names
// ---------------------------------------------------------------------------

/// The name of a mapping strategy, as written in configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    SameNames,
    Explicit,
    Prefix,
    AllToDirectory,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SameNames => write!(f, "same_names"),
            Self::Explicit => write!(f, "explicit"),
            Self::Prefix => write!(f, "prefix"),
            Self::AllToDirectory => write!(f, "all_to_directory"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "same_names" => Ok(Self::SameNames),
            "explicit" => Ok(Self::Explicit),
            "prefix" => Ok(Self::Prefix),
            "all_to_directory" => Ok(Self::AllToDirectory),
            other => Err(MappingError::InvalidStrategyConfig {
                field: "mapping_strategy".into(),
                detail: format!(
                    "unknown strategy '{}' (expected same_names, explicit, prefix or all_to_directory)",
                    other
                ),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated strategy
// ---------------------------------------------------------------------------

/// A validated mapping strategy with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingStrategy {
    /// Every file keeps its name under `target_path`.
    SameNames { target_path: String },

    /// Only files named in `file_mappings` are synced, each to its mapped
    /// path. Mapping iteration order never affects the result.
    Explicit {
        file_mappings: BTreeMap<String, String>,
    },

    /// `prefix` is stripped from names that carry it; other names pass
    /// through unchanged. Either way the result lands under `target_path`.
    ///
    /// Pass-through (rather than exclusion) of non-matching names may be
    /// tightened in a later release.
    Prefix { target_path: String, prefix: String },

    /// Same behaviour as [`MappingStrategy::SameNames`], kept as its own tag.
    AllToDirectory { target_path: String },
}

impl MappingStrategy {
    /// Build and validate a strategy from raw configuration values.
    ///
    /// `file_mappings` is only consulted (and then required) for
    /// [`StrategyKind::Explicit`]. An empty `target_path` means the root.
    pub fn from_parts(
        kind: StrategyKind,
        target_path: &str,
        file_prefix: &str,
        file_mappings: Option<&serde_json::Value>,
    ) -> Result<Self, MappingError> {
        let target_path = if target_path.trim().is_empty() {
            DEFAULT_TARGET_PATH.to_string()
        } else {
            target_path.to_string()
        };

        let strategy = match kind {
            StrategyKind::SameNames => Self::SameNames { target_path },
            StrategyKind::AllToDirectory => Self::AllToDirectory { target_path },
            StrategyKind::Prefix => Self::Prefix {
                target_path,
                prefix: file_prefix.to_string(),
            },
            StrategyKind::Explicit => {
                let value = file_mappings.ok_or_else(|| MappingError::InvalidStrategyConfig {
                    field: "file_mappings".into(),
                    detail: "required when mapping strategy is 'explicit'".into(),
                })?;
                Self::Explicit {
                    file_mappings: parse_file_mappings(value)?,
                }
            }
        };
        Ok(strategy)
    }

    /// The configuration name of this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SameNames { .. } => StrategyKind::SameNames,
            Self::Explicit { .. } => StrategyKind::Explicit,
            Self::Prefix { .. } => StrategyKind::Prefix,
            Self::AllToDirectory { .. } => StrategyKind::AllToDirectory,
        }
    }

    /// Target directory, for strategies that have one.
    pub fn target_path(&self) -> Option<&str> {
        match self {
            Self::SameNames { target_path }
            | Self::Prefix { target_path, .. }
            | Self::AllToDirectory { target_path } => Some(target_path),
            Self::Explicit { .. } => None,
        }
    }
}

/// Validate a JSON object of source name to destination path.
///
/// A string value is taken as a JSON document holding that object, which is
/// how the action input arrives.
pub fn parse_file_mappings(
    value: &serde_json::Value,
) -> Result<BTreeMap<String, String>, MappingError> {
    match value {
        serde_json::Value::String(raw) => parse_file_mappings_json(raw),
        other => mapping_object(other),
    }
}

fn mapping_object(
    value: &serde_json::Value,
) -> Result<BTreeMap<String, String>, MappingError> {
    let object = value
        .as_object()
        .ok_or_else(|| MappingError::InvalidStrategyConfig {
            field: "file_mappings".into(),
            detail: format!("expected a JSON object, got {}", json_type_name(value)),
        })?;

    let mut mappings = BTreeMap::new();
    for (source, destination) in object {
        if source.trim().is_empty() {
            return Err(MappingError::InvalidStrategyConfig {
                field: "file_mappings".into(),
                detail: "source file names must not be empty".into(),
            });
        }
        let destination = destination
            .as_str()
            .ok_or_else(|| MappingError::InvalidStrategyConfig {
                field: format!("file_mappings.{}", source),
                detail: format!(
                    "destination must be a string, got {}",
                    json_type_name(destination)
                ),
            })?;
        mappings.insert(source.clone(), destination.to_string());
    }
    Ok(mappings)
}

/// Parse `file_mappings` given as a JSON document (the action input form).
pub fn parse_file_mappings_json(raw: &str) -> Result<BTreeMap<String, String>, MappingError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| MappingError::InvalidStrategyConfig {
            field: "file_mappings".into(),
            detail: format!("not valid JSON: {}", e),
        })?;
    mapping_object(&value)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
