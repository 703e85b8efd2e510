//! Console rendering.

use super::Report;
use crate::checks::{CheckKind, CheckResult, Details, Status};
use crate::config::DisplayOptions;
use console::style;
use std::fmt::Write;

/// Renders the list of checks about to run.
#[must_use]
pub fn render_plan(checks: &[CheckKind]) -> String {
    let mut out = String::new();
    let width = checks.iter().map(|k| k.name().len()).max().unwrap_or(0);

    let _ = writeln!(out, "{} {} checks", style("Running").bold(), checks.len());
    for kind in checks {
        let _ = writeln!(
            out,
            "  {} {:width$}  {}",
            style("•").dim(),
            kind.name(),
            style(kind.description()).dim()
        );
    }
    out
}

/// Renders every section the options ask for.
#[must_use]
pub fn render_details(report: &Report, options: &DisplayOptions) -> String {
    let mut out = String::new();

    render_section(
        &mut out,
        "Failures",
        &report.failures().collect::<Vec<_>>(),
        options,
    );
    if options.show_warnings {
        render_section(
            &mut out,
            "Warnings",
            &report.warnings().collect::<Vec<_>>(),
            options,
        );
    }
    if options.show_successful {
        render_section(
            &mut out,
            "Successful checks",
            &report.successful().collect::<Vec<_>>(),
            options,
        );
    }

    out
}

/// Renders the one-line outcome.
#[must_use]
pub fn render_summary(report: &Report) -> String {
    if report.is_empty() {
        return format!("{} No checks ran\n", style("-").dim());
    }

    let counts = format!(
        "{} failed, {} warnings, {} passed",
        report.failure_count(),
        report.warning_count(),
        report.success_count()
    );

    if report.has_failures() {
        format!("{} Quality checks failed ({counts})\n", style("✗").red())
    } else if report.has_warnings() {
        format!(
            "{} Quality checks passed with warnings ({counts})\n",
            style("!").yellow()
        )
    } else {
        format!("{} All quality checks passed ({counts})\n", style("✓").green())
    }
}

fn render_section(out: &mut String, title: &str, results: &[&CheckResult], options: &DisplayOptions) {
    if results.is_empty() && !options.show_empty_sections {
        return;
    }

    let _ = writeln!(out, "{}", style(format!("{title} ({})", results.len())).bold());
    if results.is_empty() {
        let _ = writeln!(out, "  {}", style("(none)").dim());
    }

    for result in results {
        let label = match result.status {
            Status::Success => style(result.status.label()).green(),
            Status::Failure => style(result.status.label()).red(),
            Status::Warning => style(result.status.label()).yellow(),
        };
        let _ = writeln!(out, "  {} ... {label}", result.name());

        if options.show_message && !result.message.is_empty() {
            let _ = writeln!(out, "    {}", result.message);
        }
        if options.show_details && !result.details.is_empty() {
            let _ = write!(out, "{}", indent(&details_yaml(&result.details), 4));
        }
    }
    out.push('\n');
}

/// Details as YAML, the way they appear in the config file.
fn details_yaml(details: &Details) -> String {
    match serde_yaml::to_string(details) {
        Ok(yaml) => yaml,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to render check details");
            String::new()
        },
    }
}

fn indent(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| format!("{:width$}{line}\n", ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::result;
    use pretty_assertions::assert_eq;

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).into_owned()
    }

    fn sample_report() -> Report {
        let mut failed = result(CheckKind::PrBodyIncludes, Status::Failure, "Missing text");
        failed.details = Details::new().with("missing", vec!["B".to_string()]);
        Report::from_results(vec![
            result(CheckKind::BranchName, Status::Success, ""),
            failed,
            result(CheckKind::CommitMessage, Status::Success, "No commits to check"),
        ])
    }

    #[test]
    fn test_plan_lists_checks() {
        let plan = plain(&render_plan(&[CheckKind::BranchName, CheckKind::PrTitle]));
        assert!(plan.starts_with("Running 2 checks\n"));
        assert!(plan.contains("branch_name"));
        assert!(plan.contains("Pull request title matches a pattern"));
    }

    #[test]
    fn test_details_sections() {
        let text = plain(&render_details(&sample_report(), &DisplayOptions::default()));
        assert_eq!(
            text,
            "Failures (1)\n  pr_body_includes ... FAIL\n    Missing text\n    missing:\n    - B\n\n\
             Warnings (0)\n  (none)\n\n\
             Successful checks (2)\n  branch_name ... PASS\n  commit_message ... PASS\n    No commits to check\n\n"
        );
    }

    #[test]
    fn test_local_options_hide_successful_and_empty() {
        let options = DisplayOptions {
            show_empty_sections: false,
            show_message: true,
            show_details: false,
            show_successful: false,
            show_warnings: true,
        };
        let text = plain(&render_details(&sample_report(), &options));
        assert_eq!(text, "Failures (1)\n  pr_body_includes ... FAIL\n    Missing text\n\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let report = sample_report();
        let options = DisplayOptions::default();
        assert_eq!(
            render_details(&report, &options),
            render_details(&report, &options)
        );
    }

    #[test]
    fn test_summary_variants() {
        assert!(plain(&render_summary(&sample_report())).contains("Quality checks failed (1 failed, 0 warnings, 2 passed)"));

        let warned = Report::from_results(vec![result(CheckKind::PrTitle, Status::Warning, "")]);
        assert!(plain(&render_summary(&warned)).contains("passed with warnings"));

        let passed = Report::from_results(vec![result(CheckKind::PrTitle, Status::Success, "")]);
        assert!(plain(&render_summary(&passed)).contains("All quality checks passed"));

        assert!(plain(&render_summary(&Report::default())).contains("No checks ran"));
    }
}
