//! Run mode detection.
//!
//! The detector decides whether prgate checks a pull request, the local
//! branch, or a commit that is being written (commit-msg hook), and where the
//! pull request URL came from.

use std::env;

/// Environment variable holding the pull request URL.
pub const PR_URL_ENV: &str = "PRGATE_PR_URL";

/// The run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// A hosted pull request: all checks, comment posted.
    PullRequest,
    /// The current local branch: branch and commit checks only.
    #[default]
    Local,
    /// A commit being written, from the commit-msg hook.
    Hook,
}

impl Mode {
    /// Returns a human-readable name for the mode.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PullRequest => "pull-request",
            Self::Local => "local",
            Self::Hook => "hook",
        }
    }

    /// Returns whether checks that need pull request data can run.
    #[must_use]
    pub const fn has_pull_request(&self) -> bool {
        matches!(self, Self::PullRequest)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a mode was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionReason {
    /// Running as the commit-msg hook.
    HookInvocation,
    /// `--pr-url` was given.
    PrUrlFlag,
    /// `PRGATE_PR_URL` was set.
    PrUrlEnv,
    /// A GitHub Actions pull request event.
    GithubActions(String),
    /// No pull request indicators.
    Default,
}

impl std::fmt::Display for DetectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HookInvocation => write!(f, "Invoked as commit-msg hook"),
            Self::PrUrlFlag => write!(f, "--pr-url flag"),
            Self::PrUrlEnv => write!(f, "{PR_URL_ENV} environment variable"),
            Self::GithubActions(event) => write!(f, "GitHub Actions event: {event}"),
            Self::Default => write!(f, "Default (no pull request given)"),
        }
    }
}

/// Result of mode detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// The detected mode.
    pub mode: Mode,
    /// Reason for the detection.
    pub reason: DetectionReason,
    /// Pull request URL, in pull request mode.
    pub pr_url: Option<String>,
}

impl Detection {
    fn pull_request(url: String, reason: DetectionReason) -> Self {
        Self {
            mode: Mode::PullRequest,
            reason,
            pr_url: Some(url),
        }
    }
}

/// Looks up an environment variable.
pub type EnvLookup = fn(&str) -> Option<String>;

/// Detector for determining the run mode.
#[derive(Debug, Clone)]
pub struct Detector<'a> {
    pr_url: Option<&'a str>,
    hook: bool,
    env: EnvLookup,
}

impl<'a> Detector<'a> {
    /// Creates a detector reading the process environment.
    #[must_use]
    pub fn new(pr_url: Option<&'a str>) -> Self {
        Self {
            pr_url,
            hook: false,
            env: process_env,
        }
    }

    /// Creates a detector for the commit-msg hook.
    #[must_use]
    pub fn hook() -> Self {
        Self {
            hook: true,
            ..Self::new(None)
        }
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Detects the run mode.
    #[must_use]
    pub fn detect(&self) -> Detection {
        // Priority 1: the hook never checks a pull request
        if self.hook {
            return Detection {
                mode: Mode::Hook,
                reason: DetectionReason::HookInvocation,
                pr_url: None,
            };
        }

        // Priority 2: explicit flag
        if let Some(url) = self.pr_url.filter(|url| !url.is_empty()) {
            return Detection::pull_request(url.to_string(), DetectionReason::PrUrlFlag);
        }

        // Priority 3: explicit environment variable
        if let Some(url) = self.var(PR_URL_ENV) {
            return Detection::pull_request(url, DetectionReason::PrUrlEnv);
        }

        // Priority 4: GitHub Actions pull request event
        if let Some(detection) = self.check_github_actions() {
            return detection;
        }

        Detection {
            mode: Mode::Local,
            reason: DetectionReason::Default,
            pr_url: None,
        }
    }

    fn check_github_actions(&self) -> Option<Detection> {
        let event = self.var("GITHUB_EVENT_NAME")?;
        if event != "pull_request" && event != "pull_request_target" {
            return None;
        }

        let number = self
            .var("GITHUB_REF")?
            .strip_prefix("refs/pull/")?
            .split('/')
            .next()?
            .parse::<u64>()
            .ok()?;
        let repository = self.var("GITHUB_REPOSITORY")?;
        let server = self
            .var("GITHUB_SERVER_URL")
            .unwrap_or_else(|| "https://github.com".to_string());

        let url = format!("{}/{repository}/pull/{number}", server.trim_end_matches('/'));
        tracing::debug!(%url, %event, "Pull request derived from GitHub Actions");
        Some(Detection::pull_request(
            url,
            DetectionReason::GithubActions(event),
        ))
    }

    fn var(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|value| !value.is_empty())
    }
}

fn process_env(name: &str) -> Option<String> {
    env::var(name).ok()
}
