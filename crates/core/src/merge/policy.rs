//! Merge policies for destinations that already exist.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Replace the existing file unconditionally.
    #[default]
    Overwrite,
    /// Leave the existing file untouched.
    SkipExisting,
    /// Reserved: write only when the gist copy is newer. Not implemented;
    /// planned as [`MergePolicy::Overwrite`].
    NewerOnly,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::SkipExisting => write!(f, "skip_existing"),
            Self::NewerOnly => write!(f, "newer_only"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "overwrite" => Ok(Self::Overwrite),
            "skip_existing" => Ok(Self::SkipExisting),
            "newer_only" => Ok(Self::NewerOnly),
            other => Err(ConfigError::InvalidValue {
                field: "merge_strategy".into(),
                detail: format!(
                    "unknown merge strategy '{}' (expected overwrite or skip_existing)",
                    other
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("overwrite".parse::<MergePolicy>().unwrap(), MergePolicy::Overwrite);
        assert_eq!(
            " skip_existing ".parse::<MergePolicy>().unwrap(),
            MergePolicy::SkipExisting
        );
        assert_eq!("newer_only".parse::<MergePolicy>().unwrap(), MergePolicy::NewerOnly);
        assert_eq!(MergePolicy::default(), MergePolicy::Overwrite);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = "merge_lines".parse::<MergePolicy>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "merge_strategy"));
    }

    #[test]
    fn test_display_round_trips_names() {
        for policy in [
            MergePolicy::Overwrite,
            MergePolicy::SkipExisting,
            MergePolicy::NewerOnly,
        ] {
            assert_eq!(policy.to_string().parse::<MergePolicy>().unwrap(), policy);
        }
    }
}
