//! Commit message formatting for sync commits.

use crate::config::CommitContext;

/// Renders the configured commit message template.
///
/// Supported placeholders: `{gist_id}`, `{actor}`, `{ref}`. Anything else in
/// braces is left as written.
pub struct CommitFormatter {
    template: String,
}

impl CommitFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Format the message for a sync of `gist_id`.
    pub fn format(&self, gist_id: &str, context: &CommitContext) -> String {
        self.template
            .replace("{gist_id}", gist_id)
            .replace("{actor}", &context.actor)
            .replace("{ref}", &context.git_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CommitContext {
        CommitContext {
            actor: "octocat".into(),
            git_ref: "refs/heads/main".into(),
        }
    }

    #[test]
    fn test_default_template() {
        let fmt = CommitFormatter::new("Sync from Gist {gist_id}");
        assert_eq!(fmt.format("abc123", &context()), "Sync from Gist abc123");
    }

    #[test]
    fn test_all_placeholders() {
        let fmt = CommitFormatter::new("gist {gist_id} by {actor} on {ref}");
        assert_eq!(
            fmt.format("abc123", &context()),
            "gist abc123 by octocat on refs/heads/main"
        );
    }

    #[test]
    fn test_unknown_placeholders_untouched() {
        let fmt = CommitFormatter::new("{gist_id} {branch}");
        assert_eq!(fmt.format("x", &CommitContext::default()), "x {branch}");
    }

    #[test]
    fn test_unknown_context_defaults() {
        let fmt = CommitFormatter::new("{actor}@{ref}");
        assert_eq!(fmt.format("x", &CommitContext::default()), "unknown@unknown");
    }
}
