//! Built-in check definitions.
//!
//! The set of checks is fixed; configuration can only enable, disable and
//! parameterize them.

use serde::{Deserialize, Serialize};

/// Names of built-in checks, as they appear in the config file.
pub mod names {
    /// Branch name format.
    pub const BRANCH_NAME: &str = "branch_name";
    /// Pull request title format.
    pub const PR_TITLE: &str = "pr_title";
    /// Unfinished checklist items in the pull request body.
    pub const PR_BODY_CHECKLIST: &str = "pr_body_checklist";
    /// Forbidden text in the pull request body.
    pub const PR_BODY_EXCLUDES: &str = "pr_body_excludes";
    /// Required text in the pull request body.
    pub const PR_BODY_INCLUDES: &str = "pr_body_includes";
    /// Commit message format.
    pub const COMMIT_MESSAGE: &str = "commit_message";
}

/// Identifies one of the built-in checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// See [`names::BRANCH_NAME`].
    BranchName,
    /// See [`names::PR_TITLE`].
    PrTitle,
    /// See [`names::PR_BODY_CHECKLIST`].
    PrBodyChecklist,
    /// See [`names::PR_BODY_EXCLUDES`].
    PrBodyExcludes,
    /// See [`names::PR_BODY_INCLUDES`].
    PrBodyIncludes,
    /// See [`names::COMMIT_MESSAGE`].
    CommitMessage,
}

impl CheckKind {
    /// All checks, in execution order.
    pub const ALL: [Self; 6] = [
        Self::BranchName,
        Self::PrTitle,
        Self::PrBodyChecklist,
        Self::PrBodyExcludes,
        Self::PrBodyIncludes,
        Self::CommitMessage,
    ];

    /// Returns the config name of the check.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BranchName => names::BRANCH_NAME,
            Self::PrTitle => names::PR_TITLE,
            Self::PrBodyChecklist => names::PR_BODY_CHECKLIST,
            Self::PrBodyExcludes => names::PR_BODY_EXCLUDES,
            Self::PrBodyIncludes => names::PR_BODY_INCLUDES,
            Self::CommitMessage => names::COMMIT_MESSAGE,
        }
    }

    /// Returns a short description for listings.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::BranchName => "Branch name matches a pattern",
            Self::PrTitle => "Pull request title matches a pattern",
            Self::PrBodyChecklist => "No unchecked checklist items in the pull request body",
            Self::PrBodyExcludes => "Pull request body contains no forbidden text",
            Self::PrBodyIncludes => "Pull request body contains all required text",
            Self::CommitMessage => "Commit subjects and bodies are well formatted",
        }
    }

    /// Returns true if the check needs a pull request to run.
    ///
    /// These checks are skipped when running against a local repository.
    #[must_use]
    pub const fn is_pr_only(&self) -> bool {
        matches!(
            self,
            Self::PrTitle | Self::PrBodyChecklist | Self::PrBodyExcludes | Self::PrBodyIncludes
        )
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown check: {s}. Expected one of: {}",
                    Self::ALL.map(|k| k.name()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!("pr_labels".parse::<CheckKind>().is_err());
        assert!("BRANCH_NAME".parse::<CheckKind>().is_err());
    }

    #[test]
    fn test_name_round_trip() {
        for kind in CheckKind::ALL {
            assert_eq!(kind.name().parse::<CheckKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name_lists_known() {
        let err = "pr_labels".parse::<CheckKind>().expect_err("unknown");
        assert!(err.contains("pr_labels"));
        assert!(err.contains("commit_message"));
    }

    #[test]
    fn test_pr_only() {
        assert!(!CheckKind::BranchName.is_pr_only());
        assert!(!CheckKind::CommitMessage.is_pr_only());
        assert!(CheckKind::PrTitle.is_pr_only());
        assert!(CheckKind::PrBodyIncludes.is_pr_only());
    }
}
