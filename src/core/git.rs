//! Git repository operations.
//!
//! This module reads what the local checks need from a Git repository: the
//! branch name, the commits of the current branch, and the message of a
//! commit that is being written.

use crate::core::error::{Error, Result};
use crate::core::model::{CommitInfo, PullRequestInfo};
use crate::core::provider::{DataNeeds, Provider};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Branches tried, in order, as the base of the current branch.
const BASE_CANDIDATES: &[&str] = &["origin/main", "origin/master", "main", "master"];

/// At most this many local commits are checked.
const MAX_LOCAL_COMMITS: usize = 50;

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
    /// Path to the .git directory (or file for worktrees).
    git_dir: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path) -> Result<Self> {
        if which::which("git").is_err() {
            return Err(Error::CommandNotFound {
                command: "git".to_string(),
            });
        }

        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel", "--git-dir"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();

        let root = lines.next().map(PathBuf::from).ok_or(Error::NotGitRepo)?;

        let git_dir = lines
            .next()
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    path.join(p)
                }
            })
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, git_dir })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .git directory path.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the hooks directory path, honoring `core.hooksPath`.
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        if let Ok(output) = self.run(&["config", "--get", "core.hooksPath"]) {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let hooks_path = PathBuf::from(&path);
                    if hooks_path.is_absolute() {
                        return hooks_path;
                    }
                    return self.root.join(hooks_path);
                }
            }
        }

        self.git_dir.join("hooks")
    }

    /// Returns the path to a specific hook.
    #[must_use]
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir().join(hook_name)
    }

    /// Returns the current branch name, or `None` for a detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let output = self.run(&["symbolic-ref", "--quiet", "--short", "HEAD"])?;

        if output.status.success() {
            return Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ));
        }

        // Exit code 1 means HEAD is not a symbolic ref
        if output.status.code() == Some(1) {
            return Ok(None);
        }

        Err(Error::git("symbolic-ref", stderr_of(&output)))
    }

    /// Returns the commit where the current branch forked from the main
    /// branch, if a main branch exists.
    pub fn base_commit(&self) -> Result<Option<String>> {
        for &candidate in BASE_CANDIDATES {
            let spec = format!("{candidate}^{{commit}}");
            if !self.run(&["rev-parse", "--verify", "--quiet", spec.as_str()])?.status.success() {
                continue;
            }

            let output = self.run(&["merge-base", "HEAD", candidate])?;
            if output.status.success() {
                let base = String::from_utf8_lossy(&output.stdout).trim().to_string();
                tracing::debug!(%candidate, %base, "Resolved base commit");
                return Ok(Some(base));
            }
        }

        Ok(None)
    }

    /// Returns true if HEAD points at a commit.
    pub fn has_commits(&self) -> Result<bool> {
        Ok(self
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])?
            .status
            .success())
    }

    /// Returns the commits of the current branch, oldest first.
    ///
    /// Without a base branch only `HEAD` is returned.
    pub fn branch_commits(&self, with_stats: bool) -> Result<Vec<CommitInfo>> {
        if !self.has_commits()? {
            return Ok(Vec::new());
        }

        let format = format!("--format={RECORD_SEP}%H{FIELD_SEP}%B{FIELD_SEP}");
        let limit = MAX_LOCAL_COMMITS.to_string();
        let range = self
            .base_commit()?
            .map_or_else(|| "HEAD".to_string(), |base| format!("{base}..HEAD"));

        let mut args = vec!["log", "--no-merges", "--reverse", format.as_str()];
        if with_stats {
            args.push("--numstat");
        }
        if range == "HEAD" {
            args.extend(["-n", "1"]);
        } else {
            args.extend(["-n", limit.as_str()]);
        }
        args.push(range.as_str());

        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(Error::git("log", stderr_of(&output)));
        }

        Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Returns lines added and removed by the staged changes.
    pub fn staged_stats(&self) -> Result<(u64, u64)> {
        let output = self.run(&["diff", "--cached", "--numstat"])?;
        if !output.status.success() {
            return Err(Error::git("diff --cached", stderr_of(&output)));
        }

        Ok(sum_numstat(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Reads the message of the commit being written.
    ///
    /// Defaults to `COMMIT_EDITMSG` in the git directory.
    pub fn read_commit_message(&self, path: Option<&Path>) -> Result<String> {
        let path = path.map_or_else(|| self.git_dir.join("COMMIT_EDITMSG"), Path::to_path_buf);
        std::fs::read_to_string(&path)
            .map_err(|e| Error::io(format!("read commit message {}", path.display()), e))
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io(format!("run git {}", args.first().unwrap_or(&"")), e))
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Parses `git log` output written with record and field separators.
fn parse_log(stdout: &str) -> Vec<CommitInfo> {
    stdout
        .split(RECORD_SEP)
        .filter(|record| !record.trim().is_empty())
        .enumerate()
        .filter_map(|(index, record)| {
            let mut fields = record.splitn(3, FIELD_SEP);
            let sha = fields.next()?.trim();
            let message = fields.next()?;
            let (additions, deletions) = sum_numstat(fields.next().unwrap_or_default());
            Some(CommitInfo::new(sha, index + 1, message.trim_end()).with_stats(additions, deletions))
        })
        .collect()
}

/// Sums `--numstat` lines. Binary files (`-`) count as zero.
fn sum_numstat(text: &str) -> (u64, u64) {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let added = parts.next()?;
            let removed = parts.next()?;
            parts.next()?;
            Some((
                added.parse::<u64>().unwrap_or(0),
                removed.parse::<u64>().unwrap_or(0),
            ))
        })
        .fold((0, 0), |(a, d), (added, removed)| (a + added, d + removed))
}

/// What a local run looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSource {
    /// The commits of the current branch.
    Branch,
    /// A commit being written; `None` reads `COMMIT_EDITMSG`.
    CommitMessage(Option<PathBuf>),
}

/// Provides data from the local repository.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    repo: GitRepo,
    source: LocalSource,
}

impl LocalProvider {
    /// Creates a provider over a repository.
    #[must_use]
    pub const fn new(repo: GitRepo, source: LocalSource) -> Self {
        Self { repo, source }
    }

    fn collect(&self, needs: DataNeeds) -> Result<PullRequestInfo> {
        let branch = self.repo.current_branch()?;
        let commits = match &self.source {
            LocalSource::Branch => self.repo.branch_commits(needs.commit_stats)?,
            LocalSource::CommitMessage(path) => {
                let raw = self.repo.read_commit_message(path.as_deref())?;
                let mut commit = CommitInfo::from_editor_message(1, &raw);
                if needs.commit_stats {
                    let (additions, deletions) = self.repo.staged_stats()?;
                    commit = commit.with_stats(additions, deletions);
                }
                vec![commit]
            },
        };

        tracing::debug!(branch = ?branch, commits = commits.len(), "Collected local data");
        Ok(PullRequestInfo {
            branch,
            commits,
            ..PullRequestInfo::default()
        })
    }
}

impl Provider for LocalProvider {
    async fn fetch(&self, needs: DataNeeds) -> Result<PullRequestInfo> {
        self.collect(needs)
    }
}
