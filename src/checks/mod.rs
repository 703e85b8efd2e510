//! Check evaluation.
//!
//! Every check is a pure function of the fetched [`PullRequestInfo`] and its
//! compiled parameters. A violated rule is not an error: it becomes a
//! [`CheckResult`] whose status depends on the check's [`FailureLevel`].

pub mod body;
pub mod builtin;
pub mod commit;
pub mod pattern;

pub use builtin::CheckKind;

use crate::config::ChecksConfig;
use crate::core::error::{Error, Result};
use crate::core::model::PullRequestInfo;
use indexmap::IndexMap;
use serde::Deserialize;

/// Severity of a violated check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureLevel {
    /// A violation fails the run.
    #[default]
    Error,
    /// A violation is reported but does not affect the exit code.
    Warning,
}

impl std::fmt::Display for FailureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The rule held.
    Success,
    /// The rule was violated at `error` level.
    Failure,
    /// The rule was violated at `warning` level.
    Warning,
}

impl Status {
    /// Returns the upper-case label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success => "PASS",
            Self::Failure => "FAIL",
            Self::Warning => "WARN",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Details
// =============================================================================

/// A value in a result's details.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum DetailValue {
    /// A single line of text.
    Text(String),
    /// A list of items.
    List(Vec<String>),
    /// A nested mapping, e.g. the errors of one commit.
    Map(Details),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for DetailValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Details> for DetailValue {
    fn from(value: Details) -> Self {
        Self::Map(value)
    }
}

/// Insertion-ordered mapping of detail keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Details(IndexMap<String, DetailValue>);

impl Details {
    /// Creates empty details.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Appends an entry. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DetailValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`Details::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetailValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// =============================================================================
// Results
// =============================================================================

/// What a rule decided, before the failure level is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The rule held, optionally with a note (e.g. why it was skipped).
    Pass(Option<String>),
    /// The rule was violated.
    Violation {
        /// Human-readable summary.
        message: String,
        /// Structured breakdown.
        details: Details,
    },
}

impl Verdict {
    /// A plain pass.
    #[must_use]
    pub const fn pass() -> Self {
        Self::Pass(None)
    }

    /// A violation without details.
    #[must_use]
    pub fn violation(message: impl Into<String>) -> Self {
        Self::Violation {
            message: message.into(),
            details: Details::new(),
        }
    }
}

/// The outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CheckResult {
    /// Which check produced the result.
    #[serde(rename = "check")]
    pub kind: CheckKind,
    /// Outcome.
    pub status: Status,
    /// Human-readable message; empty for a plain success.
    pub message: String,
    /// Structured breakdown of the violation.
    #[serde(skip_serializing_if = "Details::is_empty")]
    pub details: Details,
}

impl CheckResult {
    /// Applies a failure level to a rule's verdict.
    #[must_use]
    pub fn from_verdict(kind: CheckKind, level: FailureLevel, verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass(note) => Self {
                kind,
                status: Status::Success,
                message: note.unwrap_or_default(),
                details: Details::new(),
            },
            Verdict::Violation { message, details } => Self {
                kind,
                status: match level {
                    FailureLevel::Error => Status::Failure,
                    FailureLevel::Warning => Status::Warning,
                },
                message,
                details,
            },
        }
    }

    /// Returns the check's config name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }
}

// =============================================================================
// Checks
// =============================================================================

/// A check's compiled rule.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Branch name must match a pattern.
    BranchName(pattern::PatternRule),
    /// Title must match a pattern.
    PrTitle(pattern::PatternRule),
    /// Body must not have unchecked checklist items.
    PrBodyChecklist(body::ChecklistRule),
    /// Body must not contain any of a set of patterns.
    PrBodyExcludes(body::TextRule),
    /// Body must contain every one of a set of patterns.
    PrBodyIncludes(body::TextRule),
    /// Every commit message must be well formed.
    CommitMessage(commit::CommitMessageRule),
}

/// An enabled check, ready to evaluate.
#[derive(Debug, Clone)]
pub struct Check {
    level: FailureLevel,
    rule: Rule,
}

impl Check {
    /// Creates a check from a compiled rule.
    #[must_use]
    pub const fn new(level: FailureLevel, rule: Rule) -> Self {
        Self { level, rule }
    }

    /// Returns which check this is.
    #[must_use]
    pub const fn kind(&self) -> CheckKind {
        match self.rule {
            Rule::BranchName(_) => CheckKind::BranchName,
            Rule::PrTitle(_) => CheckKind::PrTitle,
            Rule::PrBodyChecklist(_) => CheckKind::PrBodyChecklist,
            Rule::PrBodyExcludes(_) => CheckKind::PrBodyExcludes,
            Rule::PrBodyIncludes(_) => CheckKind::PrBodyIncludes,
            Rule::CommitMessage(_) => CheckKind::CommitMessage,
        }
    }

    /// Returns the configured failure level.
    #[must_use]
    pub const fn level(&self) -> FailureLevel {
        self.level
    }

    /// Returns true if the check needs stats (line-change counts) per commit.
    #[must_use]
    pub fn needs_commit_stats(&self) -> bool {
        matches!(&self.rule, Rule::CommitMessage(rule) if rule.needs_stats())
    }

    /// Evaluates the check against fetched data.
    #[must_use]
    pub fn evaluate(&self, pr: &PullRequestInfo) -> CheckResult {
        let verdict = match &self.rule {
            Rule::BranchName(rule) => rule.evaluate_branch(pr.branch.as_deref()),
            Rule::PrTitle(rule) => rule.evaluate_title(&pr.title),
            Rule::PrBodyChecklist(rule) => rule.evaluate(&pr.body),
            Rule::PrBodyExcludes(rule) => rule.evaluate_excludes(&pr.body),
            Rule::PrBodyIncludes(rule) => rule.evaluate_includes(&pr.body),
            Rule::CommitMessage(rule) => rule.evaluate(&pr.commits),
        };

        CheckResult::from_verdict(self.kind(), self.level, verdict)
    }
}

/// Compiles every enabled check, in execution order.
///
/// Fails with [`Error::ConfigInvalid`] naming the offending field when a
/// pattern does not compile or a required parameter is missing.
pub fn build(config: &ChecksConfig) -> Result<Vec<Check>> {
    let mut checks = Vec::new();

    if let Some(params) = &config.branch_name {
        let rule = pattern::PatternRule::new(
            "checks.branch_name.pattern",
            &params.pattern,
            params.pattern_descr.clone(),
        )?;
        checks.push(Check::new(params.failure_level, Rule::BranchName(rule)));
    }

    if let Some(params) = &config.pr_title {
        let rule = pattern::PatternRule::new(
            "checks.pr_title.pattern",
            &params.pattern,
            params.pattern_descr.clone(),
        )?;
        checks.push(Check::new(params.failure_level, Rule::PrTitle(rule)));
    }

    if let Some(params) = &config.pr_body_checklist {
        checks.push(Check::new(
            params.failure_level,
            Rule::PrBodyChecklist(body::ChecklistRule::new()?),
        ));
    }

    if let Some(params) = &config.pr_body_excludes {
        let rule = body::TextRule::new(
            "checks.pr_body_excludes.patterns",
            &params.patterns,
            params.ignore_case,
        )?;
        checks.push(Check::new(params.failure_level, Rule::PrBodyExcludes(rule)));
    }

    if let Some(params) = &config.pr_body_includes {
        let rule = body::TextRule::new(
            "checks.pr_body_includes.patterns",
            &params.patterns,
            params.ignore_case,
        )?;
        checks.push(Check::new(params.failure_level, Rule::PrBodyIncludes(rule)));
    }

    if let Some(params) = &config.commit_message {
        let rule = commit::CommitMessageRule::new(params)?;
        checks.push(Check::new(params.failure_level, Rule::CommitMessage(rule)));
    }

    Ok(checks)
}

/// Compiles a user-supplied regex, reporting failures against `field`.
pub(crate) fn compile(field: &str, pattern: &str) -> Result<regex::Regex> {
    if pattern.is_empty() {
        return Err(Error::config_invalid(field, "Pattern must not be empty"));
    }
    regex::Regex::new(pattern).map_err(|e| Error::config_invalid(field, e.to_string()))
}
