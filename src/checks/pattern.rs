//! Single-pattern rules: `branch_name` and `pr_title`.

use super::{compile, Details, Verdict};
use crate::core::error::Result;
use regex::Regex;

/// A value that must match a regex.
///
/// The regex is used with search semantics; anchors belong in the pattern.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    descr: Option<String>,
}

impl PatternRule {
    /// Compiles the pattern. `field` names the config key in errors.
    pub fn new(field: &str, pattern: &str, descr: Option<String>) -> Result<Self> {
        Ok(Self {
            regex: compile(field, pattern)?,
            descr,
        })
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Checks a branch name. A missing branch (detached HEAD) passes.
    #[must_use]
    pub fn evaluate_branch(&self, branch: Option<&str>) -> Verdict {
        let Some(branch) = branch else {
            return Verdict::Pass(Some(
                "Branch name not available (detached HEAD), skipping".to_string(),
            ));
        };

        if branch.is_empty() {
            return Verdict::violation("Branch name is empty");
        }

        self.evaluate("Branch name", "branch", branch)
    }

    /// Checks a pull request title.
    #[must_use]
    pub fn evaluate_title(&self, title: &str) -> Verdict {
        if title.is_empty() {
            return Verdict::violation("PR title is empty");
        }

        self.evaluate("PR title", "title", title)
    }

    fn evaluate(&self, what: &str, key: &str, value: &str) -> Verdict {
        if self.regex.is_match(value) {
            return Verdict::pass();
        }

        let mut message = format!(
            "{what} \"{value}\" does not match pattern: \"{}\"",
            self.pattern()
        );
        let mut details = Details::new()
            .with(key, value)
            .with("pattern", self.pattern());
        if let Some(descr) = &self.descr {
            message.push_str(&format!(". Explanation: {descr}"));
            details.insert("explanation", descr.as_str());
        }

        Verdict::Violation { message, details }
    }
}
