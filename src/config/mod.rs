//! Configuration handling for prgate.
//!
//! The config file has two sections: `settings`, which controls the reports,
//! and `checks`, which enables and parameterizes the built-in checks. YAML is
//! the primary format; files ending in `.toml` are read as TOML.

use crate::checks::{self, FailureLevel};
use crate::core::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".prgate.yml";

/// File names searched for, in order of preference.
pub const CONFIG_FILE_NAMES: &[&str] = &[CONFIG_FILE_NAME, ".prgate.yaml", "prgate.toml"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Report settings.
    pub settings: Settings,
    /// Enabled checks and their parameters.
    pub checks: ChecksConfig,
}

impl Config {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;
        let config = if is_toml(path) {
            Self::from_toml(&content)?
        } else {
            Self::from_yaml(&content)?
        };

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file is a valid (empty) configuration
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| Error::config_parse_with_source(format!("Invalid YAML: {e}"), e))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config_parse_with_source(format!("Invalid TOML: {e}"), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the configuration file by searching up the directory tree.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        Self::find_config_file_from(&cwd)
    }

    /// Finds the configuration file starting from a specific directory.
    pub fn find_config_file_from(start: &Path) -> Result<PathBuf> {
        let mut current = start;
        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Ok(config_path);
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: start.join(CONFIG_FILE_NAME),
        })
    }

    /// Validates the configuration.
    ///
    /// Compiles every pattern, so a config that validates can always be
    /// turned into checks.
    pub fn validate(&self) -> Result<()> {
        if humantime::parse_duration(&self.settings.github.timeout).is_err() {
            return Err(Error::config_invalid(
                "settings.github.timeout",
                format!("Invalid duration: {}", self.settings.github.timeout),
            ));
        }

        checks::build(&self.checks)?;
        Ok(())
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })
    }

    /// Generates configuration for a specific preset.
    #[must_use]
    pub fn for_preset(preset: &str) -> Self {
        crate::presets::config(preset)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// =============================================================================
// Settings
// =============================================================================

/// Report and provider settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Comment posted on the pull request.
    pub pr_comment_report: CommentReportSettings,
    /// Console output when checking a pull request.
    pub console_report: ConsoleReportSettings,
    /// Console output when checking a local repository.
    pub local_console_report: LocalConsoleReportSettings,
    /// GitHub API access.
    pub github: GithubSettings,
}

/// Which parts of a report to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplayOptions {
    /// Render a section header even when the section has no entries.
    pub show_empty_sections: bool,
    /// Render each result's message.
    pub show_message: bool,
    /// Render each result's structured details.
    pub show_details: bool,
    /// Render the successful checks.
    pub show_successful: bool,
    /// Render the warnings.
    pub show_warnings: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_empty_sections: true,
            show_message: true,
            show_details: true,
            show_successful: true,
            show_warnings: true,
        }
    }
}

/// Settings for the pull request comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct CommentReportSettings {
    /// Post a comment at all.
    pub enabled: bool,
    /// Delete earlier prgate comments before posting.
    pub delete_previous: bool,
    /// See [`DisplayOptions::show_empty_sections`].
    pub show_empty_sections: bool,
    /// See [`DisplayOptions::show_message`].
    pub show_message: bool,
    /// See [`DisplayOptions::show_details`].
    pub show_details: bool,
    /// See [`DisplayOptions::show_successful`].
    pub show_successful: bool,
}

impl Default for CommentReportSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delete_previous: false,
            show_empty_sections: false,
            show_message: true,
            show_details: false,
            show_successful: true,
        }
    }
}

impl CommentReportSettings {
    /// Returns the display options for the comment.
    #[must_use]
    pub const fn display(&self) -> DisplayOptions {
        DisplayOptions {
            show_empty_sections: self.show_empty_sections,
            show_message: self.show_message,
            show_details: self.show_details,
            show_successful: self.show_successful,
            show_warnings: true,
        }
    }
}

/// Settings for console output in pull request mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConsoleReportSettings {
    /// See [`DisplayOptions::show_empty_sections`].
    pub show_empty_sections: bool,
    /// See [`DisplayOptions::show_message`].
    pub show_message: bool,
    /// See [`DisplayOptions::show_details`].
    pub show_details: bool,
    /// See [`DisplayOptions::show_successful`].
    pub show_successful: bool,
}

impl Default for ConsoleReportSettings {
    fn default() -> Self {
        Self {
            show_empty_sections: true,
            show_message: true,
            show_details: true,
            show_successful: true,
        }
    }
}

impl ConsoleReportSettings {
    /// Returns the display options for the console.
    #[must_use]
    pub const fn display(&self) -> DisplayOptions {
        DisplayOptions {
            show_empty_sections: self.show_empty_sections,
            show_message: self.show_message,
            show_details: self.show_details,
            show_successful: self.show_successful,
            show_warnings: true,
        }
    }
}

/// Settings for console output in local and hook mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct LocalConsoleReportSettings {
    /// See [`DisplayOptions::show_empty_sections`].
    pub show_empty_sections: bool,
    /// See [`DisplayOptions::show_message`].
    pub show_message: bool,
    /// See [`DisplayOptions::show_details`].
    pub show_details: bool,
    /// See [`DisplayOptions::show_successful`].
    pub show_successful: bool,
    /// See [`DisplayOptions::show_warnings`].
    pub show_warnings: bool,
}

impl Default for LocalConsoleReportSettings {
    fn default() -> Self {
        Self {
            show_empty_sections: false,
            show_message: true,
            show_details: true,
            show_successful: false,
            show_warnings: true,
        }
    }
}

impl LocalConsoleReportSettings {
    /// Returns the display options for the console.
    #[must_use]
    pub const fn display(&self) -> DisplayOptions {
        DisplayOptions {
            show_empty_sections: self.show_empty_sections,
            show_message: self.show_message,
            show_details: self.show_details,
            show_successful: self.show_successful,
            show_warnings: self.show_warnings,
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GithubSettings {
    /// API base URL; `GITHUB_API_URL` or the public API when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Per-request timeout, e.g. `30s`.
    pub timeout: String,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout: "30s".to_string(),
        }
    }
}

impl GithubSettings {
    /// Returns the request timeout.
    ///
    /// Falls back to 30 seconds; [`Config::validate`] rejects bad values
    /// before this is reached.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        humantime::parse_duration(&self.timeout).unwrap_or(Duration::from_secs(30))
    }
}

// =============================================================================
// Checks
// =============================================================================

/// Parameters of every enabled check. A `None` entry is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksConfig {
    /// `branch_name` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<BranchNameParams>,
    /// `pr_title` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<PrTitleParams>,
    /// `pr_body_checklist` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub pr_body_checklist: Option<ChecklistParams>,
    /// `pr_body_excludes` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub pr_body_excludes: Option<ExcludesParams>,
    /// `pr_body_includes` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub pr_body_includes: Option<IncludesParams>,
    /// `commit_message` parameters.
    #[serde(deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<CommitMessageParams>,
}

impl ChecksConfig {
    /// Returns the failure level of an enabled check.
    #[must_use]
    pub fn failure_level(&self, kind: checks::CheckKind) -> Option<FailureLevel> {
        use checks::CheckKind;
        match kind {
            CheckKind::BranchName => self.branch_name.as_ref().map(|p| p.failure_level),
            CheckKind::PrTitle => self.pr_title.as_ref().map(|p| p.failure_level),
            CheckKind::PrBodyChecklist => self.pr_body_checklist.as_ref().map(|p| p.failure_level),
            CheckKind::PrBodyExcludes => self.pr_body_excludes.as_ref().map(|p| p.failure_level),
            CheckKind::PrBodyIncludes => self.pr_body_includes.as_ref().map(|p| p.failure_level),
            CheckKind::CommitMessage => self.commit_message.as_ref().map(|p| p.failure_level),
        }
    }

    /// Returns the enabled checks in execution order.
    #[must_use]
    pub fn enabled(&self) -> Vec<checks::CheckKind> {
        checks::CheckKind::ALL
            .into_iter()
            .filter(|kind| self.failure_level(*kind).is_some())
            .collect()
    }
}

/// A check listed with no parameters (`pr_body_checklist:`) is enabled with
/// its defaults.
fn enabled<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

/// Parameters of `branch_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BranchNameParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
    /// Regex the branch name must match.
    pub pattern: String,
    /// Human explanation of the pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_descr: Option<String>,
}

impl Default for BranchNameParams {
    fn default() -> Self {
        Self {
            failure_level: FailureLevel::Error,
            pattern: r"^[\w\d\-]+$".to_string(),
            pattern_descr: Some(
                "Branch name must only include letters, numbers and dashes".to_string(),
            ),
        }
    }
}

/// Parameters of `pr_title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrTitleParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
    /// Regex the title must match.
    pub pattern: String,
    /// Human explanation of the pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_descr: Option<String>,
}

impl Default for PrTitleParams {
    fn default() -> Self {
        Self {
            failure_level: FailureLevel::Error,
            pattern: "^[A-Z].+$".to_string(),
            pattern_descr: Some("PR title must start with an uppercase character".to_string()),
        }
    }
}

/// Parameters of `pr_body_checklist`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChecklistParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
}

/// Parameters of `pr_body_excludes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludesParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
    /// Text that must not appear. Required.
    pub patterns: Vec<String>,
    /// Compare without regard to case.
    pub ignore_case: bool,
}

impl Default for ExcludesParams {
    fn default() -> Self {
        Self {
            failure_level: FailureLevel::Error,
            patterns: Vec::new(),
            ignore_case: true,
        }
    }
}

/// Parameters of `pr_body_includes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IncludesParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
    /// Text that must appear. Required.
    pub patterns: Vec<String>,
    /// Compare without regard to case.
    pub ignore_case: bool,
}

/// Parameters of `commit_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommitMessageParams {
    /// Severity of a violation.
    pub failure_level: FailureLevel,
    /// Subject rules.
    pub subject: SubjectParams,
    /// Body rules.
    pub body: BodyParams,
}

/// Commit subject rules. Each rule set to `null` is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectParams {
    /// Minimum subject length, inclusive.
    pub min_length: Option<usize>,
    /// Maximum subject length, inclusive.
    pub max_length: Option<usize>,
    /// Regex the subject must match.
    pub pattern: Option<String>,
    /// Human explanation of the pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_descr: Option<String>,
}

impl Default for SubjectParams {
    fn default() -> Self {
        Self {
            min_length: Some(8),
            max_length: Some(50),
            pattern: Some(r"^[A-Z].+[^.]$".to_string()),
            pattern_descr: Some(
                "Commit message subject must start with a capital letter and not finish with a dot"
                    .to_string(),
            ),
        }
    }
}

/// Commit body rules. Each rule set to `null` is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BodyParams {
    /// Maximum length of each body line.
    pub max_line_length: Option<usize>,
    /// Accept over-long lines that contain a URL.
    pub ignore_urls: bool,
    /// Require a body on large commits.
    pub smart_require: Option<SmartRequireParams>,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            max_line_length: Some(72),
            ignore_urls: true,
            smart_require: Some(SmartRequireParams::default()),
        }
    }
}

/// Body requirement for large commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmartRequireParams {
    /// A commit with more changed lines than this needs a body.
    pub min_changes: u64,
    /// Minimum number of non-empty body lines on such a commit.
    pub min_body_lines: usize,
}

impl Default for SmartRequireParams {
    fn default() -> Self {
        Self {
            min_changes: 100,
            min_body_lines: 1,
        }
    }
}
