//! Normalized pull request and commit data.
//!
//! Providers (GitHub, the local repository, the commit-msg hook) all produce
//! these types, so checks never need to know where the data came from.

/// Line git writes above the part of a commit message it will discard.
const SCISSORS_LINE: &str = "# ------------------------ >8 ------------------------";

/// A single commit, split into subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit hash (empty for a commit that doesn't exist yet).
    pub sha: String,
    /// Position within the pull request, starting at 1.
    pub order: usize,
    /// The message exactly as the provider returned it.
    pub message: String,
    /// First paragraph of the message.
    pub subject: String,
    /// Lines after the first blank line, trimmed.
    pub body: Vec<String>,
    /// Lines added by the commit.
    pub additions: u64,
    /// Lines removed by the commit.
    pub deletions: u64,
    /// Web URL of the commit, if known.
    pub url: Option<String>,
}

impl CommitInfo {
    /// Builds a commit from its raw message.
    #[must_use]
    pub fn new(sha: impl Into<String>, order: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        let (subject, body) = split_message(&message);
        Self {
            sha: sha.into(),
            order,
            message,
            subject,
            body,
            additions: 0,
            deletions: 0,
            url: None,
        }
    }

    /// Builds a commit from a message file written by `git commit`.
    ///
    /// Comment lines and everything below the scissors line are dropped the
    /// same way git's default cleanup would.
    #[must_use]
    pub fn from_editor_message(order: usize, raw: &str) -> Self {
        Self::new(String::new(), order, strip_comments(raw))
    }

    /// Sets the line-change counts.
    #[must_use]
    pub const fn with_stats(mut self, additions: u64, deletions: u64) -> Self {
        self.additions = additions;
        self.deletions = deletions;
        self
    }

    /// Sets the web URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Total changed lines (added + removed).
    #[must_use]
    pub const fn changes(&self) -> u64 {
        self.additions + self.deletions
    }

    /// Abbreviated hash, or `None` if the commit has no hash yet.
    #[must_use]
    pub fn short_sha(&self) -> Option<&str> {
        if self.sha.is_empty() {
            None
        } else {
            Some(&self.sha[..self.sha.len().min(7)])
        }
    }
}

/// Everything the checks look at for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestInfo {
    /// Pull request title (empty outside pull request mode).
    pub title: String,
    /// Pull request description (empty if none was written).
    pub body: String,
    /// Head branch name; `None` for a detached HEAD.
    pub branch: Option<String>,
    /// Commits, oldest first.
    pub commits: Vec<CommitInfo>,
}

impl PullRequestInfo {
    /// Creates pull request data with the given title and body.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    /// Sets the branch name.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Sets the commits.
    #[must_use]
    pub fn with_commits(mut self, commits: Vec<CommitInfo>) -> Self {
        self.commits = commits;
        self
    }
}

/// Splits a message into the subject paragraph and the trimmed body lines.
fn split_message(message: &str) -> (String, Vec<String>) {
    let lines: Vec<&str> = message.lines().map(str::trim).collect();

    match lines.iter().position(|line| line.is_empty()) {
        Some(separator) => {
            let subject = lines[..separator].join(" ");
            let body = lines[separator + 1..]
                .iter()
                .map(|line| (*line).to_string())
                .collect();
            (subject, body)
        },
        None => (lines.join(" "), Vec::new()),
    }
}

fn strip_comments(raw: &str) -> String {
    let mut kept = Vec::new();
    for line in raw.lines() {
        if line == SCISSORS_LINE {
            break;
        }
        if line.starts_with('#') {
            continue;
        }
        kept.push(line);
    }

    // Leading blank lines would otherwise become an empty subject
    while kept.first().is_some_and(|line| line.trim().is_empty()) {
        kept.remove(0);
    }

    kept.join("\n")
}
