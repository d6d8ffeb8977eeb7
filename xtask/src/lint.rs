use crate::cli::LintArgs;
use color_eyre::eyre::Result;
use duct::cmd;
use std::fs;
use std::io::Write;

// ---------------------------------------------------------------------------
// Functional Core
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckId {
    Fmt,
    Check,
    Clippy,
    Test,
    Machete,
}

/// A cargo invocation in the lint pipeline.
#[derive(Debug, PartialEq, Eq)]
struct Check {
    id: CheckId,
    args: Vec<String>,
    /// Skipped (not failed) when the cargo subcommand is not installed.
    optional: bool,
}

impl Check {
    fn name(&self) -> String {
        format!("cargo {}", self.args.join(" "))
    }
}

enum CheckOutcome {
    Passed { output: String },
    Failed { output: String },
    Skipped,
}

struct CheckResult {
    name: String,
    outcome: CheckOutcome,
}

/// Build the ordered list of checks for the given flags.
fn plan(args: &LintArgs) -> Vec<Check> {
    let scope: Vec<String> = match &args.package {
        Some(package) => vec!["-p".to_string(), package.clone()],
        None => vec!["--workspace".to_string()],
    };
    let with_scope = |head: &[&str], tail: &[&str]| -> Vec<String> {
        head.iter()
            .map(|s| s.to_string())
            .chain(scope.iter().cloned())
            .chain(tail.iter().map(|s| s.to_string()))
            .collect()
    };

    let mut checks = Vec::new();
    if !args.no_fmt {
        let fmt: &[&str] = if args.fix {
            &["fmt", "--all"]
        } else {
            &["fmt", "--all", "--check"]
        };
        checks.push(Check {
            id: CheckId::Fmt,
            args: fmt.iter().map(|s| s.to_string()).collect(),
            optional: false,
        });
    }
    checks.push(Check {
        id: CheckId::Check,
        args: with_scope(&["check", "--all-targets"], &[]),
        optional: false,
    });
    if !args.no_clippy {
        checks.push(Check {
            id: CheckId::Clippy,
            args: with_scope(&["clippy", "--all-targets"], &["--", "-D", "warnings"]),
            optional: false,
        });
    }
    if !args.no_test {
        checks.push(Check {
            id: CheckId::Test,
            args: with_scope(&["test"], &[]),
            optional: false,
        });
    }
    checks.push(Check {
        id: CheckId::Machete,
        args: vec!["machete".to_string()],
        optional: true,
    });

    checks
}

fn is_tool_not_found(output: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains("no such command") || lower.contains("unrecognized subcommand")
}

fn determine_outcome(success: bool, output: String, optional: bool) -> CheckOutcome {
    if optional && !success && is_tool_not_found(&output) {
        return CheckOutcome::Skipped;
    }
    if success {
        CheckOutcome::Passed { output }
    } else {
        CheckOutcome::Failed { output }
    }
}

fn format_log_entry(result: &CheckResult) -> String {
    match &result.outcome {
        CheckOutcome::Skipped => format!("=== {} ===\n[skipped, not installed]\n", result.name),
        CheckOutcome::Passed { output } | CheckOutcome::Failed { output } => {
            format!("=== {} ===\n{}\n", result.name, output)
        }
    }
}

// ---------------------------------------------------------------------------
// Imperative Shell
// ---------------------------------------------------------------------------

/// Run the lint pipeline, stopping at the first failing check.
pub fn run(args: &LintArgs) -> Result<()> {
    let target_dir = std::env::current_dir()?.join("target");
    fs::create_dir_all(&target_dir)?;
    let log_path = target_dir.join("xtask-lint.log");
    let mut log_file = fs::File::create(&log_path)?;

    for check in plan(args) {
        let name = check.name();
        println!("[run] {name}");

        let output = cmd("cargo", &check.args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        let result = CheckResult {
            name,
            outcome: determine_outcome(output.status.success(), text, check.optional),
        };

        write!(log_file, "{}", format_log_entry(&result))?;

        match &result.outcome {
            CheckOutcome::Skipped => println!("[skip] {}", result.name),
            CheckOutcome::Passed { output } => {
                if args.verbose {
                    print!("{output}");
                }
            }
            CheckOutcome::Failed { output } => {
                print!("{output}");
                println!("\nlint failed at: {}", result.name);
                println!("log: {}", log_path.display());
                drop(log_file);
                std::process::exit(1);
            }
        }
    }

    println!("log: {}", log_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(checks: &[Check]) -> Vec<CheckId> {
        checks.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_plan_default() {
        let checks = plan(&LintArgs::default());
        assert_eq!(
            ids(&checks),
            vec![
                CheckId::Fmt,
                CheckId::Check,
                CheckId::Clippy,
                CheckId::Test,
                CheckId::Machete
            ]
        );
        assert_eq!(checks[0].name(), "cargo fmt --all --check");
        assert_eq!(
            checks[2].name(),
            "cargo clippy --all-targets --workspace -- -D warnings"
        );
    }

    #[test]
    fn test_plan_scoped_to_package() {
        let args = LintArgs {
            package: Some("matome_core".to_string()),
            ..Default::default()
        };
        let checks = plan(&args);
        assert_eq!(checks[3].name(), "cargo test -p matome_core");
    }

    #[test]
    fn test_plan_skips_and_fix() {
        let args = LintArgs {
            fix: true,
            no_clippy: true,
            no_test: true,
            ..Default::default()
        };
        let checks = plan(&args);
        assert_eq!(
            ids(&checks),
            vec![CheckId::Fmt, CheckId::Check, CheckId::Machete]
        );
        assert_eq!(checks[0].name(), "cargo fmt --all");
    }

    #[test]
    fn test_determine_outcome() {
        assert!(matches!(
            determine_outcome(true, "ok".to_string(), false),
            CheckOutcome::Passed { .. }
        ));
        assert!(matches!(
            determine_outcome(false, "error[E0308]".to_string(), true),
            CheckOutcome::Failed { .. }
        ));
        assert!(matches!(
            determine_outcome(false, "error: no such command: `machete`".to_string(), true),
            CheckOutcome::Skipped
        ));
    }

    #[test]
    fn test_format_log_entry() {
        let result = CheckResult {
            name: "cargo machete".to_string(),
            outcome: CheckOutcome::Skipped,
        };
        assert_eq!(
            format_log_entry(&result),
            "=== cargo machete ===\n[skipped, not installed]\n"
        );
    }
}
