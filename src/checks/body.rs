//! Pull request body rules: `pr_body_checklist`, `pr_body_excludes` and
//! `pr_body_includes`.

use super::{Details, Verdict};
use crate::core::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Markdown task list item that is not ticked, capturing its text.
const UNCHECKED_ITEM: &str = r"(?m)^[ \t]*[-*+][ \t]+\[ \][ \t]*(.*?)[ \t\r]*$";

/// Finds unticked checklist items.
#[derive(Debug, Clone)]
pub struct ChecklistRule {
    item: Regex,
}

impl ChecklistRule {
    /// Creates the rule.
    pub fn new() -> Result<Self> {
        let item = Regex::new(UNCHECKED_ITEM).map_err(|e| Error::Internal {
            message: format!("Checklist pattern: {e}"),
        })?;
        Ok(Self { item })
    }

    /// Checks a pull request body.
    #[must_use]
    pub fn evaluate(&self, body: &str) -> Verdict {
        let items: Vec<String> = self
            .item
            .captures_iter(body)
            .map(|caps| caps.get(1).map_or("", |m| m.as_str()).to_string())
            .collect();

        if items.is_empty() {
            return Verdict::pass();
        }

        Verdict::Violation {
            message: format!("Found {} unfinished checklist items", items.len()),
            details: Details::new().with("unchecked", items),
        }
    }
}

/// A set of literal substrings searched for in the body.
#[derive(Debug, Clone)]
pub struct TextRule {
    patterns: Vec<(String, Regex)>,
}

impl TextRule {
    /// Compiles the substrings. At least one is required.
    pub fn new(field: &str, patterns: &[String], ignore_case: bool) -> Result<Self> {
        if patterns.is_empty() {
            return Err(Error::config_invalid(
                field,
                "At least one pattern is required",
            ));
        }

        let patterns = patterns
            .iter()
            .map(|pattern| {
                if pattern.is_empty() {
                    return Err(Error::config_invalid(field, "Pattern must not be empty"));
                }
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(ignore_case)
                    .multi_line(true)
                    .build()
                    .map(|regex| (pattern.clone(), regex))
                    .map_err(|e| Error::config_invalid(field, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Fails if any pattern is found.
    #[must_use]
    pub fn evaluate_excludes(&self, body: &str) -> Verdict {
        let found = self.select(body, true);
        if found.is_empty() {
            return Verdict::pass();
        }

        Verdict::Violation {
            message: format!("Forbidden strings found in PR body: {}", quoted(&found)),
            details: Details::new().with("found", found),
        }
    }

    /// Fails if any pattern is missing.
    #[must_use]
    pub fn evaluate_includes(&self, body: &str) -> Verdict {
        let missing = self.select(body, false);
        if missing.is_empty() {
            return Verdict::pass();
        }

        Verdict::Violation {
            message: format!(
                "Required strings in PR body are missing: {}",
                quoted(&missing)
            ),
            details: Details::new().with("missing", missing),
        }
    }

    fn select(&self, body: &str, present: bool) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(body) == present)
            .map(|(pattern, _)| pattern.clone())
            .collect()
    }
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::DetailValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn checklist() -> ChecklistRule {
        ChecklistRule::new().expect("checklist pattern")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    // =========================================================================
    // Checklist
    // =========================================================================

    #[test]
    fn test_checklist_lists_unchecked_items() {
        let verdict = checklist().evaluate("- [ ] todo\n- [x] done");
        assert_eq!(
            verdict,
            Verdict::Violation {
                message: "Found 1 unfinished checklist items".to_string(),
                details: Details::new().with("unchecked", strings(&["todo"])),
            }
        );
    }

    #[rstest]
    #[case("- [x] done\n- [X] also done")]
    #[case("")]
    #[case("No checklist here, just [ ] brackets")]
    fn test_checklist_passes(#[case] body: &str) {
        assert_eq!(checklist().evaluate(body), Verdict::pass());
    }

    #[test]
    fn test_checklist_bullets_and_indentation() {
        let body = "## Tasks\r\n* [ ] star\r\n  + [ ] nested plus  \r\n\t- [ ]\r\n";
        assert_eq!(
            checklist().evaluate(body),
            Verdict::Violation {
                message: "Found 3 unfinished checklist items".to_string(),
                details: Details::new().with(
                    "unchecked",
                    DetailValue::List(strings(&["star", "nested plus", ""]))
                ),
            }
        );
    }

    // =========================================================================
    // Excludes / includes
    // =========================================================================

    #[test]
    fn test_excludes_case_insensitive() {
        let rule = TextRule::new("f", &strings(&["WIP", "DO NOT MERGE"]), true).expect("build");
        let verdict = rule.evaluate_excludes("This is still wip");
        assert_eq!(
            verdict,
            Verdict::Violation {
                message: r#"Forbidden strings found in PR body: "WIP""#.to_string(),
                details: Details::new().with("found", strings(&["WIP"])),
            }
        );
        assert_eq!(rule.evaluate_excludes("Ready"), Verdict::pass());
    }

    #[test]
    fn test_includes_lists_only_missing() {
        let rule = TextRule::new("f", &strings(&["A", "B"]), false).expect("build");
        assert_eq!(
            rule.evaluate_includes("A"),
            Verdict::Violation {
                message: r#"Required strings in PR body are missing: "B""#.to_string(),
                details: Details::new().with("missing", strings(&["B"])),
            }
        );
    }

    #[test]
    fn test_includes_case_sensitive_by_flag() {
        let sensitive = TextRule::new("f", &strings(&["Closes"]), false).expect("build");
        let insensitive = TextRule::new("f", &strings(&["Closes"]), true).expect("build");
        assert!(matches!(
            sensitive.evaluate_includes("closes #1"),
            Verdict::Violation { .. }
        ));
        assert_eq!(insensitive.evaluate_includes("closes #1"), Verdict::pass());
    }

    #[test]
    fn test_includes_empty_body_fails() {
        let rule = TextRule::new("f", &strings(&["Summary"]), false).expect("build");
        assert!(matches!(rule.evaluate_includes(""), Verdict::Violation { .. }));
    }

    #[rstest]
    #[case("[WIP]", "Ready for review, tests pass", true)]
    #[case("[WIP]", "[wip] still going", false)]
    #[case("v1.0", "Bumps to v1x0", true)]
    #[case("v1.0", "Bumps to v1.0", false)]
    #[case("a+b", "aab", true)]
    fn test_excludes_match_literal_text(
        #[case] pattern: &str,
        #[case] body: &str,
        #[case] passes: bool,
    ) {
        let rule = TextRule::new("f", &strings(&[pattern]), true).expect("build");
        assert_eq!(rule.evaluate_excludes(body) == Verdict::pass(), passes, "{body}");
    }

    #[test]
    fn test_includes_match_literal_text() {
        let rule = TextRule::new("f", &strings(&["v1.0", "## Testing"]), false).expect("build");
        assert_eq!(
            rule.evaluate_includes("Bumps to v1x0\n## Testing\ndone"),
            Verdict::Violation {
                message: r#"Required strings in PR body are missing: "v1.0""#.to_string(),
                details: Details::new().with("missing", strings(&["v1.0"])),
            }
        );
        assert_eq!(
            rule.evaluate_includes("Bumps to v1.0\n\n## Testing\ndone"),
            Verdict::pass()
        );
    }

    #[test]
    fn test_patterns_required() {
        let err = TextRule::new("checks.pr_body_includes.patterns", &[], false)
            .expect_err("empty");
        assert!(matches!(err, Error::ConfigInvalid { ref field, .. }
            if field == "checks.pr_body_includes.patterns"));
    }

    #[test]
    fn test_unbalanced_brackets_are_plain_text() {
        let rule = TextRule::new("f", &strings(&["(unclosed"]), true).expect("build");
        assert!(matches!(
            rule.evaluate_excludes("left (unclosed here"),
            Verdict::Violation { .. }
        ));
    }
}
