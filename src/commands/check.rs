use crate::config::DuplicatePolicy;
use crate::manifest::ParseOutcome;
use crate::{ui, Config, Manifest};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Issue {
    severity: Severity,
    message: String,
}

pub fn execute(config: &Config, files: Vec<PathBuf>) -> Result<()> {
    let files = if files.is_empty() {
        vec![config.manifest_path()?]
    } else {
        files
    };

    let mut failures = 0usize;
    let mut warnings = 0usize;
    let mut requirements = 0usize;

    for path in &files {
        // An unreadable file is reported and the remaining files are still checked
        let issues = match Manifest::load(path) {
            Ok(outcome) => {
                requirements += outcome.manifest.len();
                collect_issues(config, path, &outcome)
            }
            Err(err) => vec![Issue {
                severity: Severity::Error,
                message: format!("{err:#}"),
            }],
        };

        for issue in issues {
            match issue.severity {
                Severity::Warning => {
                    warnings += 1;
                    ui::warn(issue.message);
                }
                Severity::Error => {
                    failures += 1;
                    ui::error(issue.message);
                }
            }
        }
    }

    debug!(files = files.len(), requirements, warnings, failures, "check finished");

    if failures > 0 {
        anyhow::bail!("Manifest validation failed ({failures} issue(s)).");
    }

    let summary = format!(
        "Validated {} manifest(s) with {requirements} requirement(s).",
        files.len()
    );
    if warnings == 0 {
        ui::success("Check", summary);
    } else {
        ui::success("Check", format!("{summary} {warnings} warning(s)."));
    }
    Ok(())
}

fn collect_issues(config: &Config, path: &Path, outcome: &ParseOutcome) -> Vec<Issue> {
    let location = path.display();
    let mut issues = Vec::new();

    for error in &outcome.errors {
        issues.push(Issue {
            severity: Severity::Error,
            message: format!("{location}: {error}"),
        });
    }

    let duplicate_severity = match config.check.duplicates {
        DuplicatePolicy::Warn => Severity::Warning,
        DuplicatePolicy::Error => Severity::Error,
    };
    for finding in &outcome.findings {
        issues.push(Issue {
            severity: duplicate_severity,
            message: format!("{location}: {finding}"),
        });
    }

    if config.check.pinned_only {
        for entry in outcome.manifest.entries().filter(|entry| !entry.is_pinned()) {
            issues.push(Issue {
                severity: Severity::Error,
                message: format!(
                    "{location}: line {}: '{entry}' does not pin an exact version",
                    entry.line.unwrap_or_default()
                ),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use crate::manifest::parse;

    fn config(duplicates: DuplicatePolicy, pinned_only: bool) -> Config {
        Config {
            check: CheckConfig {
                duplicates,
                pinned_only,
            },
            ..Config::default()
        }
    }

    fn severities(issues: &[Issue]) -> Vec<Severity> {
        issues.iter().map(|issue| issue.severity).collect()
    }

    #[test]
    fn clean_manifest_has_no_issues() {
        let outcome = parse("black==22.6.0\nsafety~=2.0.0\n");
        let issues = collect_issues(
            &Config::default(),
            Path::new("dev-requirements.txt"),
            &outcome,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn malformed_lines_are_errors() {
        let outcome = parse("black==22.6.0\nbadline\n");
        let issues = collect_issues(&Config::default(), Path::new("reqs.txt"), &outcome);
        assert_eq!(severities(&issues), vec![Severity::Error]);
        assert!(issues[0].message.starts_with("reqs.txt: line 2:"));
        assert!(issues[0].message.contains("'badline'"));
    }

    #[test]
    fn duplicate_policy_controls_severity() {
        let outcome = parse("black==22.6.0\nblack==22.3.0\n");
        let path = Path::new("reqs.txt");

        let warn = collect_issues(&config(DuplicatePolicy::Warn, false), path, &outcome);
        assert_eq!(severities(&warn), vec![Severity::Warning]);
        assert!(warn[0].message.contains("conflicting duplicate entry for 'black'"));

        let error = collect_issues(&config(DuplicatePolicy::Error, false), path, &outcome);
        assert_eq!(severities(&error), vec![Severity::Error]);
    }

    #[test]
    fn pinned_only_flags_ranges() {
        let outcome = parse("black==22.6.0\nsafety~=2.0.0\n");
        let issues = collect_issues(
            &config(DuplicatePolicy::Warn, true),
            Path::new("reqs.txt"),
            &outcome,
        );
        assert_eq!(severities(&issues), vec![Severity::Error]);
        assert_eq!(
            issues[0].message,
            "reqs.txt: line 2: 'safety~=2.0.0' does not pin an exact version"
        );
    }
}
