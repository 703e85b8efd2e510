//! Result aggregation and rendering.
//!
//! A [`Report`] is built once per run from the check results in execution
//! order. The renderers in [`console`] and [`comment`] are pure functions of
//! a report and its [`DisplayOptions`](crate::config::DisplayOptions).

pub mod comment;
pub mod console;

use crate::checks::{CheckResult, Status};

/// The aggregated outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    results: Vec<CheckResult>,
}

impl Report {
    /// Aggregates results, keeping their execution order.
    #[must_use]
    pub fn from_results(results: Vec<CheckResult>) -> Self {
        Self { results }
    }

    /// Returns every result in execution order.
    #[must_use]
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Returns the failed results.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.with_status(Status::Failure)
    }

    /// Returns the results with warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &CheckResult> {
        self.with_status(Status::Warning)
    }

    /// Returns the successful results.
    pub fn successful(&self) -> impl Iterator<Item = &CheckResult> {
        self.with_status(Status::Success)
    }

    /// Returns the number of failures.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Returns the number of successful checks.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successful().count()
    }

    /// Returns the number of checks that ran.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no check ran.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns true if any check failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Returns true if any check has a warning.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Process exit code for this report: 1 if anything failed.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_failures())
    }

    fn with_status(&self, status: Status) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(move |r| r.status == status)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::checks::{CheckKind, CheckResult, Details, Status};

    pub fn result(kind: CheckKind, status: Status, message: &str) -> CheckResult {
        CheckResult {
            kind,
            status,
            message: message.to_string(),
            details: Details::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::result;
    use super::*;
    use crate::checks::CheckKind;

    #[test]
    fn test_counts_and_exit_code() {
        let report = Report::from_results(vec![
            result(CheckKind::BranchName, Status::Success, ""),
            result(CheckKind::PrTitle, Status::Failure, "bad title"),
            result(CheckKind::CommitMessage, Status::Success, ""),
        ]);

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.total(), 3);
        assert!(report.has_failures());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let report = Report::from_results(vec![
            result(CheckKind::BranchName, Status::Warning, "odd branch"),
            result(CheckKind::CommitMessage, Status::Success, ""),
        ]);

        assert!(report.has_warnings());
        assert!(!report.has_failures());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_partition_keeps_execution_order() {
        let report = Report::from_results(vec![
            result(CheckKind::BranchName, Status::Failure, ""),
            result(CheckKind::PrTitle, Status::Success, ""),
            result(CheckKind::PrBodyChecklist, Status::Failure, ""),
            result(CheckKind::CommitMessage, Status::Failure, ""),
        ]);

        let failed: Vec<&str> = report.failures().map(CheckResult::name).collect();
        assert_eq!(
            failed,
            vec!["branch_name", "pr_body_checklist", "commit_message"]
        );
    }

    #[test]
    fn test_empty_report() {
        let report = Report::default();
        assert!(report.is_empty());
        assert_eq!(report.exit_code(), 0);
    }
}
