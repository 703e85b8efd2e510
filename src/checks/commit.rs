//! The `commit_message` rule.
//!
//! Each commit is validated on its own; the rule is violated if any commit
//! breaks any sub-rule. Per-commit errors are nested under a key naming the
//! commit's position (and short hash, when it has one).

use super::{compile, Details, Verdict};
use crate::config::{CommitMessageParams, SmartRequireParams};
use crate::core::error::{Error, Result};
use crate::core::model::CommitInfo;
use regex::Regex;

/// A body line containing this skips every rule for the commit.
pub const IGNORE_COMMIT_FLAG: &str = "[!prgate]";

/// A body line ending with this is exempt from the line-length rule.
pub const IGNORE_LINE_FLAG: &str = "#!prgate";

const URL_PATTERN: &str = r"(?:https?|ftp)://\S+";

/// Compiled `commit_message` parameters.
#[derive(Debug, Clone)]
pub struct CommitMessageRule {
    min_length: Option<usize>,
    max_length: Option<usize>,
    subject_pattern: Option<Regex>,
    pattern_descr: Option<String>,
    max_line_length: Option<usize>,
    ignore_urls: bool,
    smart_require: Option<SmartRequireParams>,
    url: Regex,
}

impl CommitMessageRule {
    /// Compiles the parameters.
    pub fn new(params: &CommitMessageParams) -> Result<Self> {
        let subject = &params.subject;
        if let (Some(min), Some(max)) = (subject.min_length, subject.max_length) {
            if min > max {
                return Err(Error::config_invalid(
                    "checks.commit_message.subject.min_length",
                    format!("min_length ({min}) is greater than max_length ({max})"),
                ));
            }
        }

        let subject_pattern = subject
            .pattern
            .as_deref()
            .map(|p| compile("checks.commit_message.subject.pattern", p))
            .transpose()?;

        let url = Regex::new(URL_PATTERN).map_err(|e| Error::Internal {
            message: format!("URL pattern: {e}"),
        })?;

        Ok(Self {
            min_length: subject.min_length,
            max_length: subject.max_length,
            subject_pattern,
            pattern_descr: subject.pattern_descr.clone(),
            max_line_length: params.body.max_line_length,
            ignore_urls: params.body.ignore_urls,
            smart_require: params.body.smart_require,
            url,
        })
    }

    /// Returns true if line-change counts are needed.
    #[must_use]
    pub const fn needs_stats(&self) -> bool {
        self.smart_require.is_some()
    }

    /// Checks every commit.
    #[must_use]
    pub fn evaluate(&self, commits: &[CommitInfo]) -> Verdict {
        if commits.is_empty() {
            return Verdict::Pass(Some("No commits to check".to_string()));
        }

        let mut details = Details::new();
        for commit in commits {
            if let Some(errors) = self.check_commit(commit) {
                details.insert(commit_key(commit), errors);
            }
        }

        if details.is_empty() {
            return Verdict::pass();
        }

        let message = format!(
            "{} of {} commit messages do not follow the expected format",
            details.len(),
            commits.len()
        );
        Verdict::Violation { message, details }
    }

    fn check_commit(&self, commit: &CommitInfo) -> Option<Details> {
        if commit
            .body
            .iter()
            .any(|line| line.contains(IGNORE_COMMIT_FLAG))
        {
            tracing::debug!(order = commit.order, "Commit opted out of message checks");
            return None;
        }

        let mut errors = Details::new();

        if let Some(message) = self.subject_length_error(&commit.subject) {
            errors.insert("subject_length", message);
        }

        if let Some(regex) = &self.subject_pattern {
            if !regex.is_match(&commit.subject) {
                let mut message = format!("Subject does not follow pattern: \"{}\"", regex.as_str());
                if let Some(descr) = &self.pattern_descr {
                    message.push_str(". Explanation: ");
                    message.push_str(descr);
                }
                errors.insert("subject_pattern", message);
            }
        }

        if let Some(max) = self.max_line_length {
            if !commit.body.iter().all(|line| self.line_ok(line, max)) {
                errors.insert(
                    "body_line_length",
                    format!("One or more lines of the body are longer than {max} characters"),
                );
            }
        }

        if let Some(smart) = self.smart_require {
            let body_lines = commit.body.iter().filter(|line| !line.is_empty()).count();
            let changes = commit.changes();
            if changes > smart.min_changes && body_lines < smart.min_body_lines {
                errors.insert(
                    "body_size",
                    format!(
                        "There are more than {} changes in total on this commit ({changes} to be exact), \
                         so the commit message body should be at least {} lines long, but it is {body_lines} instead",
                        smart.min_changes, smart.min_body_lines
                    ),
                );
            }
        }

        if errors.is_empty() {
            return None;
        }

        let mut entry = Details::new().with("subject", commit.subject.as_str());
        if let Some(url) = &commit.url {
            entry.insert("url", url.as_str());
        }
        for (key, value) in errors.iter() {
            entry.insert(key, value.clone());
        }
        Some(entry)
    }

    fn subject_length_error(&self, subject: &str) -> Option<String> {
        let length = subject.chars().count();
        let too_short = self.min_length.is_some_and(|min| length < min);
        let too_long = self.max_length.is_some_and(|max| length > max);
        if !too_short && !too_long {
            return None;
        }

        let bounds = match (self.min_length, self.max_length) {
            (Some(min), Some(max)) => format!("between {min} and {max}"),
            (Some(min), None) => format!("at least {min}"),
            (None, Some(max)) => format!("at most {max}"),
            (None, None) => return None,
        };
        Some(format!(
            "Subject has {length} characters but should be {bounds}"
        ))
    }

    fn line_ok(&self, line: &str, max: usize) -> bool {
        line.trim_end().ends_with(IGNORE_LINE_FLAG)
            || line.chars().count() <= max
            || (self.ignore_urls && self.url.is_match(line))
    }
}

fn commit_key(commit: &CommitInfo) -> String {
    match commit.short_sha() {
        Some(short) => format!("commit {} ({short})", commit.order),
        None => format!("commit {}", commit.order),
    }
}
