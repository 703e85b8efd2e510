//! Check runner.
//!
//! This module orchestrates a run: pick the checks for the mode, fetch what
//! they need from a [`Provider`], evaluate them in order and publish the
//! report.

use crate::checks::{self, Check, CheckKind};
use crate::config::Config;
use crate::core::detector::Mode;
use crate::core::error::{Error, Result};
use crate::core::model::PullRequestInfo;
use crate::core::provider::{CommentSink, DataNeeds, PostedComment, Provider};
use crate::report::{comment, Report};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Runner for executing checks.
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
    mode: Mode,
    checks: Vec<Check>,
}

impl Runner {
    /// Creates a runner with the checks enabled for the mode.
    ///
    /// Checks that need a pull request are dropped outside pull request mode.
    pub fn new(config: Config, mode: Mode) -> Result<Self> {
        let checks: Vec<Check> = checks::build(&config.checks)?
            .into_iter()
            .filter(|check| mode.has_pull_request() || !check.kind().is_pr_only())
            .collect();

        tracing::debug!(%mode, checks = checks.len(), "Runner ready");
        Ok(Self {
            config,
            mode,
            checks,
        })
    }

    /// Restricts the run to the named checks.
    ///
    /// Unknown names are rejected. Known checks that are disabled or not
    /// available in this mode are ignored.
    pub fn only(mut self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }

        let mut wanted = Vec::with_capacity(names.len());
        for name in names {
            let kind = name.parse::<CheckKind>().map_err(|_| Error::CheckNotFound {
                name: name.clone(),
            })?;
            if !self.checks.iter().any(|c| c.kind() == kind) {
                tracing::warn!(check = %kind, mode = %self.mode, "Check is not enabled for this run");
            }
            wanted.push(kind);
        }

        self.checks.retain(|check| wanted.contains(&check.kind()));
        Ok(self)
    }

    /// Returns the run mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the checks that will run, in order.
    #[must_use]
    pub fn planned(&self) -> Vec<CheckKind> {
        self.checks.iter().map(Check::kind).collect()
    }

    /// Returns what the checks need from the provider.
    #[must_use]
    pub fn needs(&self) -> DataNeeds {
        DataNeeds {
            commit_stats: self.checks.iter().any(Check::needs_commit_stats),
        }
    }

    /// Evaluates every check against fetched data.
    #[must_use]
    pub fn evaluate(&self, data: &PullRequestInfo) -> Report {
        let results = self
            .checks
            .iter()
            .map(|check| {
                let result = check.evaluate(data);
                tracing::debug!(check = result.name(), status = %result.status, "Check evaluated");
                result
            })
            .collect();
        Report::from_results(results)
    }

    /// Fetches data and runs every check.
    ///
    /// A fetch failure aborts the run before any check is evaluated.
    pub async fn run<P: Provider>(&self, provider: &P) -> Result<Report> {
        if self.checks.is_empty() {
            tracing::debug!("No checks enabled, skipping fetch");
            return Ok(Report::default());
        }

        let needs = self.needs();
        tracing::debug!(?needs, "Fetching data");

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message(match self.mode {
            Mode::PullRequest => "Fetching pull request...",
            Mode::Local | Mode::Hook => "Reading Git history...",
        });
        pb.enable_steady_tick(Duration::from_millis(100));

        let fetched = provider.fetch(needs).await;
        pb.finish_and_clear();
        let data = fetched?;
        tracing::debug!(commits = data.commits.len(), "Data fetched");

        let report = self.evaluate(&data);
        tracing::debug!(
            failures = report.failure_count(),
            warnings = report.warning_count(),
            successful = report.success_count(),
            "Checks executed"
        );
        Ok(report)
    }

    /// Posts the report as a pull request comment.
    ///
    /// Publishing never fails the run: errors are logged and `None` is
    /// returned.
    pub async fn publish<S: CommentSink>(
        &self,
        report: &Report,
        sink: &S,
        details_url: Option<&str>,
    ) -> Option<PostedComment> {
        let settings = &self.config.settings.pr_comment_report;
        if !settings.enabled {
            tracing::debug!("Pull request comment disabled");
            return None;
        }

        if settings.delete_previous {
            match sink.delete_previous().await {
                Ok(count) => tracing::debug!(count, "Deleted previous report comments"),
                Err(e) => tracing::warn!(error = %e, "Failed to delete previous report comments"),
            }
        }

        let body = comment::render(report, &settings.display(), details_url);
        match sink.post(&body).await {
            Ok(posted) => {
                tracing::debug!(id = posted.id, "Report comment posted");
                Some(posted)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to post report comment");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Status;
    use crate::config::{ChecklistParams, CommitMessageParams, PrTitleParams, SmartRequireParams};
    use crate::core::model::CommitInfo;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // =========================================================================
    // Test doubles
    // =========================================================================

    #[derive(Debug, Default)]
    struct FakeProvider {
        data: PullRequestInfo,
        requested: Mutex<Vec<DataNeeds>>,
    }

    impl Provider for FakeProvider {
        async fn fetch(&self, needs: DataNeeds) -> Result<PullRequestInfo> {
            self.requested.lock().expect("lock").push(needs);
            Ok(self.data.clone())
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    impl Provider for FailingProvider {
        async fn fetch(&self, _needs: DataNeeds) -> Result<PullRequestInfo> {
            Err(Error::api(401, "repos/a/b/pulls/1", "Authentication failed"))
        }
    }

    #[derive(Debug, Default)]
    struct FakeSink {
        fail: bool,
        deletes: Mutex<usize>,
        posted: Mutex<Vec<String>>,
    }

    impl CommentSink for FakeSink {
        async fn delete_previous(&self) -> Result<usize> {
            *self.deletes.lock().expect("lock") += 1;
            if self.fail {
                return Err(Error::api(403, "comments", "forbidden"));
            }
            Ok(2)
        }

        async fn post(&self, body: &str) -> Result<PostedComment> {
            if self.fail {
                return Err(Error::api(403, "comments", "forbidden"));
            }
            self.posted.lock().expect("lock").push(body.to_string());
            Ok(PostedComment { id: 1, url: None })
        }
    }

    fn pr_config() -> Config {
        Config::for_preset("default")
    }

    fn good_pr() -> PullRequestInfo {
        PullRequestInfo::new("Add widgets", "- [x] tests")
            .with_branch("feature-widgets")
            .with_commits(vec![CommitInfo::new("abc1234", 1, "Add widget model")])
    }

    // =========================================================================
    // Check selection
    // =========================================================================

    #[test]
    fn test_pull_request_mode_runs_all_enabled() {
        let runner = Runner::new(pr_config(), Mode::PullRequest).expect("runner");
        assert_eq!(
            runner.planned(),
            vec![
                CheckKind::BranchName,
                CheckKind::PrTitle,
                CheckKind::PrBodyChecklist,
                CheckKind::PrBodyExcludes,
                CheckKind::CommitMessage,
            ]
        );
    }

    #[test]
    fn test_local_mode_drops_pr_only_checks() {
        for mode in [Mode::Local, Mode::Hook] {
            let runner = Runner::new(pr_config(), mode).expect("runner");
            assert_eq!(
                runner.planned(),
                vec![CheckKind::BranchName, CheckKind::CommitMessage]
            );
        }
    }

    #[test]
    fn test_only_filters_checks() {
        let runner = Runner::new(pr_config(), Mode::PullRequest)
            .expect("runner")
            .only(&["commit_message".to_string(), "pr_title".to_string()])
            .expect("only");
        assert_eq!(
            runner.planned(),
            vec![CheckKind::PrTitle, CheckKind::CommitMessage]
        );
    }

    #[test]
    fn test_only_rejects_unknown_names() {
        let err = Runner::new(pr_config(), Mode::Local)
            .expect("runner")
            .only(&["pr_labels".to_string()])
            .expect_err("unknown");
        assert!(matches!(err, Error::CheckNotFound { ref name } if name == "pr_labels"));
    }

    #[test]
    fn test_only_disabled_check_runs_nothing() {
        let runner = Runner::new(pr_config(), Mode::Local)
            .expect("runner")
            .only(&["pr_title".to_string()])
            .expect("only");
        assert!(runner.planned().is_empty());
    }

    #[test]
    fn test_needs_commit_stats_only_with_smart_require() {
        let runner = Runner::new(pr_config(), Mode::PullRequest).expect("runner");
        assert!(runner.needs().commit_stats);

        let mut config = pr_config();
        if let Some(params) = config.checks.commit_message.as_mut() {
            params.body.smart_require = None;
        }
        let runner = Runner::new(config, Mode::PullRequest).expect("runner");
        assert!(!runner.needs().commit_stats);
    }

    // =========================================================================
    // Running
    // =========================================================================

    #[tokio::test]
    async fn test_run_evaluates_in_order() {
        let provider = FakeProvider {
            data: good_pr(),
            ..FakeProvider::default()
        };
        let runner = Runner::new(pr_config(), Mode::PullRequest).expect("runner");

        let report = runner.run(&provider).await.expect("run");
        let names: Vec<&str> = report.results().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "branch_name",
                "pr_title",
                "pr_body_checklist",
                "pr_body_excludes",
                "commit_message"
            ]
        );
        assert!(!report.has_failures());
        assert_eq!(
            *provider.requested.lock().expect("lock"),
            vec![DataNeeds { commit_stats: true }]
        );
    }

    #[tokio::test]
    async fn test_run_reports_violations() {
        let mut config = Config::default();
        config.checks.pr_title = Some(PrTitleParams::default());
        config.checks.pr_body_checklist = Some(ChecklistParams {
            failure_level: checks::FailureLevel::Warning,
        });
        let provider = FakeProvider {
            data: PullRequestInfo::new("lowercase title", "- [ ] docs"),
            ..FakeProvider::default()
        };

        let report = Runner::new(config, Mode::PullRequest)
            .expect("runner")
            .run(&provider)
            .await
            .expect("run");

        assert_eq!(report.results()[0].status, Status::Failure);
        assert_eq!(report.results()[1].status, Status::Warning);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_run_without_checks_skips_fetch() {
        let provider = FakeProvider::default();
        let report = Runner::new(Config::default(), Mode::PullRequest)
            .expect("runner")
            .run(&provider)
            .await
            .expect("run");

        assert!(report.is_empty());
        assert!(provider.requested.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts() {
        let err = Runner::new(pr_config(), Mode::PullRequest)
            .expect("runner")
            .run(&FailingProvider)
            .await
            .expect_err("fetch fails");
        assert!(matches!(err, Error::Api { status: 401, .. }));
        assert_eq!(err.exit_code(), 69);
    }

    #[tokio::test]
    async fn test_smart_require_uses_fetched_stats() {
        let mut config = Config::default();
        let mut params = CommitMessageParams::default();
        params.body.smart_require = Some(SmartRequireParams {
            min_changes: 10,
            min_body_lines: 1,
        });
        config.checks.commit_message = Some(params);

        let provider = FakeProvider {
            data: PullRequestInfo::default().with_commits(vec![
                CommitInfo::new("abc1234", 1, "Rewrite the parser").with_stats(40, 2),
            ]),
            ..FakeProvider::default()
        };
        let report = Runner::new(config, Mode::Local)
            .expect("runner")
            .run(&provider)
            .await
            .expect("run");

        assert_eq!(report.failure_count(), 1);
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    #[tokio::test]
    async fn test_publish_posts_comment() {
        let runner = Runner::new(pr_config(), Mode::PullRequest).expect("runner");
        let report = runner.evaluate(&good_pr());
        let sink = FakeSink::default();

        let posted = runner
            .publish(&report, &sink, Some("https://ci.example.com/7"))
            .await;

        assert_eq!(posted, Some(PostedComment { id: 1, url: None }));
        assert_eq!(*sink.deletes.lock().expect("lock"), 0);
        let bodies = sink.posted.lock().expect("lock");
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].starts_with(comment::MARKER));
        assert!(bodies[0].contains("https://ci.example.com/7"));
    }

    #[tokio::test]
    async fn test_publish_deletes_previous_when_configured() {
        let mut config = pr_config();
        config.settings.pr_comment_report.delete_previous = true;
        let runner = Runner::new(config, Mode::PullRequest).expect("runner");
        let sink = FakeSink::default();

        runner.publish(&Report::default(), &sink, None).await;
        assert_eq!(*sink.deletes.lock().expect("lock"), 1);
        assert_eq!(sink.posted.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn test_publish_disabled() {
        let mut config = pr_config();
        config.settings.pr_comment_report.enabled = false;
        let runner = Runner::new(config, Mode::PullRequest).expect("runner");
        let sink = FakeSink::default();

        assert_eq!(runner.publish(&Report::default(), &sink, None).await, None);
        assert!(sink.posted.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_fatal() {
        let mut config = pr_config();
        config.settings.pr_comment_report.delete_previous = true;
        let runner = Runner::new(config, Mode::PullRequest).expect("runner");
        let sink = FakeSink {
            fail: true,
            ..FakeSink::default()
        };

        assert_eq!(runner.publish(&Report::default(), &sink, None).await, None);
        assert_eq!(*sink.deletes.lock().expect("lock"), 1);
    }
}
