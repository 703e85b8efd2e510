//! Data sources and report sinks.
//!
//! The runner only talks to these traits, so the check pipeline can be
//! driven by GitHub, the local repository, or a test double.

use crate::core::error::Result;
use crate::core::model::PullRequestInfo;
use std::future::Future;

/// What the enabled checks need from a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataNeeds {
    /// Line-change counts per commit.
    pub commit_stats: bool,
}

/// Fetches the data to check.
pub trait Provider {
    /// Fetches pull request (or local) data.
    fn fetch(&self, needs: DataNeeds) -> impl Future<Output = Result<PullRequestInfo>> + Send;
}

/// A comment posted on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    /// Comment id.
    pub id: u64,
    /// Web URL of the comment, when known.
    pub url: Option<String>,
}

/// Publishes the report as a pull request comment.
pub trait CommentSink {
    /// Deletes every earlier report comment, returning how many were removed.
    fn delete_previous(&self) -> impl Future<Output = Result<usize>> + Send;

    /// Posts a new comment.
    fn post(&self, body: &str) -> impl Future<Output = Result<PostedComment>> + Send;
}
