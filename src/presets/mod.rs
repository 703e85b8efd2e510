//! Configuration presets.
//!
//! Presets are starting points written by `prgate init`; every value they
//! set can be edited afterwards.

use crate::checks::FailureLevel;
use crate::config::{
    BranchNameParams, ChecklistParams, ChecksConfig, CommitMessageParams, Config, ExcludesParams,
    PrTitleParams, SubjectParams,
};

/// Available preset names.
pub mod names {
    /// Every check with its defaults.
    pub const DEFAULT: &str = "default";
    /// Conventional Commits for commit subjects and pull request titles.
    pub const CONVENTIONAL: &str = "conventional";
    /// Every violation fails the run.
    pub const STRICT: &str = "strict";
}

/// Conventional Commits subject format.
pub const CONVENTIONAL_PATTERN: &str =
    r"^(feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(\(.+\))?!?: .+$";

/// Branch format used with Conventional Commits.
pub const CONVENTIONAL_BRANCH_PATTERN: &str =
    r"^(feat|fix|docs|chore|refactor|test|ci)/[a-z0-9._-]+$";

/// Returns a list of available preset names.
#[must_use]
pub const fn available() -> &'static [&'static str] {
    &[names::DEFAULT, names::CONVENTIONAL, names::STRICT]
}

/// Returns a description for a preset.
#[must_use]
pub fn description(name: &str) -> &'static str {
    match name {
        names::DEFAULT => "All checks with defaults; checklist and commit messages only warn",
        names::CONVENTIONAL => "Conventional Commits for titles, subjects and branch names",
        names::STRICT => "All checks fail the run; previous PR comments are replaced",
        _ => "Unknown preset",
    }
}

/// Builds the configuration of a preset.
///
/// Unknown names fall back to the default preset.
#[must_use]
pub fn config(name: &str) -> Config {
    match name {
        names::CONVENTIONAL => conventional(),
        names::STRICT => strict(),
        names::DEFAULT => base(),
        _ => {
            tracing::warn!(preset = %name, "Unknown preset, using default");
            base()
        },
    }
}

fn base() -> Config {
    Config {
        checks: ChecksConfig {
            branch_name: Some(BranchNameParams::default()),
            pr_title: Some(PrTitleParams::default()),
            pr_body_checklist: Some(ChecklistParams {
                failure_level: FailureLevel::Warning,
            }),
            pr_body_excludes: Some(ExcludesParams {
                patterns: vec!["DO NOT MERGE".to_string(), "WIP".to_string()],
                ..ExcludesParams::default()
            }),
            pr_body_includes: None,
            commit_message: Some(CommitMessageParams {
                failure_level: FailureLevel::Warning,
                ..CommitMessageParams::default()
            }),
        },
        ..Config::default()
    }
}

fn conventional() -> Config {
    let mut config = base();
    config.checks.branch_name = Some(BranchNameParams {
        pattern: CONVENTIONAL_BRANCH_PATTERN.to_string(),
        pattern_descr: Some("Branch name must be <type>/<short-name>, e.g. feat/login".to_string()),
        ..BranchNameParams::default()
    });
    config.checks.pr_title = Some(PrTitleParams {
        pattern: CONVENTIONAL_PATTERN.to_string(),
        pattern_descr: Some("PR title must follow Conventional Commits".to_string()),
        ..PrTitleParams::default()
    });
    config.checks.commit_message = Some(CommitMessageParams {
        failure_level: FailureLevel::Error,
        subject: SubjectParams {
            max_length: Some(72),
            pattern: Some(CONVENTIONAL_PATTERN.to_string()),
            pattern_descr: Some(
                "Commit subject must follow Conventional Commits, e.g. \"fix(parser): handle tabs\""
                    .to_string(),
            ),
            ..SubjectParams::default()
        },
        ..CommitMessageParams::default()
    });
    config
}

fn strict() -> Config {
    let mut config = base();
    if let Some(checklist) = config.checks.pr_body_checklist.as_mut() {
        checklist.failure_level = FailureLevel::Error;
    }
    if let Some(commit) = config.checks.commit_message.as_mut() {
        commit.failure_level = FailureLevel::Error;
    }

    let comment = &mut config.settings.pr_comment_report;
    comment.delete_previous = true;
    comment.show_details = true;
    config
}
