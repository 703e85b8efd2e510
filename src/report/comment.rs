//! Markdown rendering for the pull request comment.

use super::Report;
use crate::checks::CheckResult;
use crate::config::DisplayOptions;

/// Hidden first line that identifies comments posted by prgate.
pub const MARKER: &str = "<!-- prgate-report -->";

/// Heading of the comment.
pub const TITLE: &str = "## PR Quality Gate";

/// Returns true if a comment body was posted by prgate.
#[must_use]
pub fn is_report_comment(body: &str) -> bool {
    body.trim_start().starts_with(MARKER)
}

/// Renders the comment body.
#[must_use]
pub fn render(report: &Report, options: &DisplayOptions, details_url: Option<&str>) -> String {
    let failures: Vec<&CheckResult> = report.failures().collect();
    let warnings: Vec<&CheckResult> = report.warnings().collect();
    let successful: Vec<&CheckResult> = report.successful().collect();

    let mut lines = vec![
        MARKER.to_string(),
        TITLE.to_string(),
        "Checking if this pull request follows the expected quality standards.".to_string(),
        String::new(),
    ];

    if report.is_empty() {
        lines.push(
            ":interrobang: No quality checks found to run. Please update your config!".to_string(),
        );
        lines.push(String::new());
    } else if failures.is_empty() && warnings.is_empty() {
        lines.push(format!(
            ":white_check_mark: All {} quality checks have passed! Good job!",
            successful.len()
        ));
        lines.push(String::new());
    } else {
        lines.push("| Failures | Warnings | Successful |".to_string());
        lines.push("| --- | --- | --- |".to_string());
        lines.push(format!(
            "| {} | {} | {} |",
            count(failures.len()),
            count(warnings.len()),
            count(successful.len())
        ));
        lines.push(String::new());

        if !failures.is_empty() || options.show_empty_sections {
            lines.push(format!(
                ":bangbang: **Failures ({})** - *These need to be fixed!*",
                failures.len()
            ));
            lines.extend(failures.iter().map(|r| format_result(r, options)));
            lines.push(String::new());
        }

        if options.show_warnings && (!warnings.is_empty() || options.show_empty_sections) {
            lines.push(format!(
                ":eight_pointed_black_star: **Warnings ({})** - *Fixing these may not be applicable, please review them case by case*",
                warnings.len()
            ));
            lines.extend(warnings.iter().map(|r| format_result(r, options)));
            lines.push(String::new());
        }
    }

    if options.show_successful && (!successful.is_empty() || options.show_empty_sections) {
        lines.push(format!(
            ":white_check_mark: **Successful ({})** - *Good job on these!*",
            successful.len()
        ));
        lines.extend(successful.iter().map(|r| format!("- **{}**", r.name())));
        lines.push(String::new());
    }

    if let Some(url) = details_url {
        lines.push(format!(
            "Visit the [details page]({url}) for more information."
        ));
    }

    let mut body = lines.join("\n");
    body.truncate(body.trim_end().len());
    body.push('\n');
    body
}

fn count(n: usize) -> String {
    if n == 0 {
        "-".to_string()
    } else {
        n.to_string()
    }
}

fn format_result(result: &CheckResult, options: &DisplayOptions) -> String {
    let mut out = format!("- **{}**", result.name());

    if options.show_message && !result.message.is_empty() {
        let message = highlight_quoted(&result.message).replace(". Explanation:", ".\n  Explanation:");
        out.push_str("\n  ");
        out.push_str(&message);
    }

    if options.show_details && !result.details.is_empty() {
        match serde_yaml::to_string(&result.details) {
            Ok(yaml) => {
                for line in highlight_quoted(&yaml).lines() {
                    out.push_str("\n  ");
                    out.push_str(line);
                }
            },
            Err(e) => tracing::warn!(error = %e, check = result.name(), "Failed to render details"),
        }
    }

    out
}

/// Wraps every `"quoted"` fragment in backticks so it renders as code.
fn highlight_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        match after.find('"') {
            Some(0) => {
                // "" stays as is
                out.push_str(&rest[..start + 2]);
                rest = &after[1..];
            },
            Some(len) => {
                out.push_str(&rest[..start]);
                out.push('`');
                out.push_str(&rest[start..start + len + 2]);
                out.push('`');
                rest = &after[len + 1..];
            },
            None => break,
        }
    }

    out.push_str(rest);
    out
}
