//! Repo-relative path joining and normalization.
//!
//! Destinations are always `/`-separated, carry no `.` or `..` segments, and
//! never start with `/`. Anything that would climb above the repository root
//! is rejected rather than clamped.

use crate::errors::MappingError;

/// Join a target directory and a filename with a single separator.
///
/// Duplicate separators are left for [`normalize_destination`] to collapse.
pub fn join_destination(dir: &str, name: &str) -> String {
    format!("{}/{}", dir, name)
}

/// Normalize `raw` into a repo-relative destination for `source_name`.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment.
/// Fails with [`MappingError::PathEscape`] for absolute paths and for any
/// `..` that would leave the root, and with
/// [`MappingError::InvalidStrategyConfig`] when nothing is left (the path
/// names the root itself, not a file).
pub fn normalize_destination(source_name: &str, raw: &str) -> Result<String, MappingError> {
    if raw.starts_with('/') {
        return Err(MappingError::PathEscape {
            source_name: source_name.to_string(),
            path: raw.to_string(),
        });
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(MappingError::PathEscape {
                        source_name: source_name.to_string(),
                        path: raw.to_string(),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(MappingError::InvalidStrategyConfig {
            field: source_name.to_string(),
            detail: format!("destination '{}' resolves to the repository root", raw),
        });
    }

    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_collapse_separators() {
        let joined = join_destination("./config/", "config.json");
        assert_eq!(joined, "./config//config.json");
        assert_eq!(
            normalize_destination("config.json", &joined).unwrap(),
            "config/config.json"
        );
    }

    #[test]
    fn test_root_target() {
        let joined = join_destination("./", "readme.md");
        assert_eq!(normalize_destination("readme.md", &joined).unwrap(), "readme.md");
    }

    #[test]
    fn test_inner_parent_segment_stays_inside() {
        assert_eq!(
            normalize_destination("a.json", "x/../y/a.json").unwrap(),
            "y/a.json"
        );
    }

    #[test]
    fn test_parent_escape_rejected() {
        let err = normalize_destination("a.json", "x/../../a.json").unwrap_err();
        assert!(matches!(err, MappingError::PathEscape { ref source_name, .. } if source_name == "a.json"));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let err = normalize_destination("a.json", "/etc/a.json").unwrap_err();
        assert!(matches!(err, MappingError::PathEscape { .. }));
    }

    #[test]
    fn test_root_only_rejected() {
        let err = normalize_destination("a.json", "./").unwrap_err();
        assert!(matches!(err, MappingError::InvalidStrategyConfig { .. }));
    }
}
