//! CLI command implementations.

use super::RunArgs;
use crate::checks::CheckKind;
use crate::config::{Config, DisplayOptions, CONFIG_FILE_NAME};
use crate::core::detector::{Detector, PR_URL_ENV};
use crate::core::error::{Error, Result};
use crate::core::git::{GitRepo, LocalProvider, LocalSource};
use crate::core::runner::Runner;
use crate::github::{GithubClient, PullRequestRef, TOKEN_ENV};
use crate::presets;
use crate::report::{console as render, Report};
use console::style;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Name of the hook prgate installs.
const HOOK_NAME: &str = "commit-msg";

/// Hook script template.
const HOOK_SCRIPT: &str = r#"#!/bin/sh
# prgate commit-msg hook - installed by `prgate install`

# Skip if PRGATE_SKIP is set
if [ "$PRGATE_SKIP" = "1" ]; then
    exit 0
fi

exec prgate hook "$1"
"#;

/// Hook marker comment.
const HOOK_MARKER: &str = "# prgate commit-msg hook";

/// Environment variable that skips the hook.
const SKIP_ENV: &str = "PRGATE_SKIP";

/// Run checks against a pull request or the current branch.
pub fn run(args: &RunArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let detection = Detector::new(args.pr_url.as_deref()).detect();
    eprintln!(
        "{} Mode: {} ({})",
        style("•").cyan(),
        style(detection.mode.name()).bold(),
        detection.reason
    );

    let runner = Runner::new(config, detection.mode)?.only(&args.only)?;

    let report = match detection.pr_url {
        Some(url) => {
            let pr: PullRequestRef = url.parse()?;
            let client = GithubClient::from_env(pr, &runner.config().settings.github)?;
            eprint!("{}", render::render_plan(&runner.planned()));

            block_on(async {
                let report = runner.run(&client).await?;
                print_report(&report, &runner.config().settings.console_report.display());
                if let Some(posted) = runner
                    .publish(&report, &client, args.details_url.as_deref())
                    .await
                {
                    eprintln!(
                        "{} Posted report to {}",
                        style("✓").green(),
                        posted.url.as_deref().unwrap_or(&url)
                    );
                }
                Ok::<_, Error>(report)
            })??
        },
        None => {
            let provider = LocalProvider::new(GitRepo::discover()?, LocalSource::Branch);
            let report = block_on(runner.run(&provider))??;
            print_report(
                &report,
                &runner.config().settings.local_console_report.display(),
            );
            report
        },
    };

    Ok(ExitCode::from(report.exit_code()))
}

/// Check the commit message being written.
pub fn hook(msg_file: Option<PathBuf>, config_path: Option<&Path>) -> Result<ExitCode> {
    // Check for skip
    if std::env::var(SKIP_ENV).ok().as_deref() == Some("1") {
        eprintln!("{} Skipping checks ({SKIP_ENV}=1)", style("•").cyan());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(config_path)?;
    let mode = Detector::hook().detect().mode;
    let runner = Runner::new(config, mode)?;

    let provider = LocalProvider::new(GitRepo::discover()?, LocalSource::CommitMessage(msg_file));
    let report = block_on(runner.run(&provider))??;

    // Stay quiet on a clean commit
    let options = runner.config().settings.local_console_report.display();
    if report.has_failures() || (options.show_warnings && report.has_warnings()) {
        print_report(&report, &options);
    }

    Ok(ExitCode::from(report.exit_code()))
}

/// Initialize configuration.
pub fn init(preset: Option<&str>, force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    // Check if config already exists
    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let preset = preset.unwrap_or(presets::names::DEFAULT);
    let config = Config::for_preset(preset);
    let yaml = format!(
        "# prgate configuration ({preset} preset)\n# {}\n{}",
        presets::description(preset),
        config.to_yaml()?
    );

    std::fs::write(&config_path, yaml).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), config_path.display());
    eprintln!("  Using preset: {preset}");

    eprintln!("\nNext steps:");
    eprintln!("  1. Review and customize {CONFIG_FILE_NAME}");
    eprintln!("  2. Run: prgate install");

    Ok(ExitCode::SUCCESS)
}

/// Install git hook.
pub fn install(force: bool) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hooks_dir = repo.hooks_dir();
    let hook_path = hooks_dir.join(HOOK_NAME);

    // Create hooks directory if needed
    if !hooks_dir.exists() {
        std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io("create hooks dir", e))?;
    }

    // Check for existing hook
    if hook_path.exists() {
        let content =
            std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read existing hook", e))?;

        // Check if it's our hook
        if content.contains(HOOK_MARKER) {
            eprintln!(
                "{} Hook already installed at {}",
                style("✓").green(),
                hook_path.display()
            );
            return Ok(ExitCode::SUCCESS);
        }

        if !force {
            return Err(Error::HookExists { path: hook_path });
        }

        // Backup existing hook
        let backup_path = hooks_dir.join(format!("{HOOK_NAME}.bak"));
        std::fs::rename(&hook_path, &backup_path).map_err(|e| Error::io("backup hook", e))?;
        eprintln!(
            "{} Backed up existing hook to {}",
            style("•").cyan(),
            backup_path.display()
        );
    }

    std::fs::write(&hook_path, HOOK_SCRIPT).map_err(|e| Error::io("write hook", e))?;

    // Make executable on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&hook_path)
            .map_err(|e| Error::io("get hook metadata", e))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&hook_path, perms).map_err(|e| Error::io("set hook perms", e))?;
    }

    eprintln!(
        "{} Installed {HOOK_NAME} hook at {}",
        style("✓").green(),
        hook_path.display()
    );

    Ok(ExitCode::SUCCESS)
}

/// Uninstall git hook.
pub fn uninstall() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hook_path = repo.hook_path(HOOK_NAME);

    if !hook_path.exists() {
        eprintln!(
            "{} No hook installed at {}",
            style("•").cyan(),
            hook_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    // Check if it's our hook
    let content = std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read hook", e))?;

    if !content.contains(HOOK_MARKER) {
        eprintln!(
            "{} Hook at {} was not installed by prgate",
            style("!").yellow(),
            hook_path.display()
        );
        eprintln!("  Remove manually if desired.");
        return Ok(ExitCode::FAILURE);
    }

    std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook", e))?;

    eprintln!(
        "{} Removed {HOOK_NAME} hook from {}",
        style("✓").green(),
        hook_path.display()
    );

    // Check for backup
    let backup_path = repo.hooks_dir().join(format!("{HOOK_NAME}.bak"));
    if backup_path.exists() {
        eprintln!(
            "  Backup exists at {} - restore if needed",
            backup_path.display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Show detected mode.
pub fn detect(pr_url: Option<&str>) -> Result<ExitCode> {
    let detection = Detector::new(pr_url).detect();

    eprintln!("Detected mode: {}", style(detection.mode.name()).bold());
    eprintln!("Reason: {}", detection.reason);
    if let Some(url) = &detection.pr_url {
        eprintln!("Pull request: {url}");
    }

    // Show environment info
    eprintln!();
    eprintln!("Environment:");

    let env_vars = [
        PR_URL_ENV,
        "GITHUB_EVENT_NAME",
        "GITHUB_REF",
        "GITHUB_REPOSITORY",
        "GITHUB_API_URL",
    ];
    for var in env_vars {
        if let Ok(value) = std::env::var(var) {
            eprintln!("  {var}={value}");
        }
    }
    let token = if std::env::var_os(TOKEN_ENV).is_some() {
        "set"
    } else {
        "not set"
    };
    eprintln!("  {TOKEN_ENV}: {token}");

    Ok(ExitCode::SUCCESS)
}

/// List configured checks.
pub fn list(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let enabled = config.checks.enabled();

    if enabled.is_empty() {
        eprintln!("{} No checks enabled", style("!").yellow());
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("{}", style("Enabled checks:").bold());
    for kind in enabled {
        print_check(&config, kind);
    }

    Ok(ExitCode::SUCCESS)
}

/// Prints a check's details.
fn print_check(config: &Config, kind: CheckKind) {
    let level = config
        .checks
        .failure_level(kind)
        .map(|level| level.to_string())
        .unwrap_or_default();
    let scope = if kind.is_pr_only() {
        format!(" {}", style("(pull request only)").dim())
    } else {
        String::new()
    };

    eprintln!(
        "  {} [{level}] - {}{scope}",
        style(kind.name()).cyan(),
        kind.description()
    );
}

/// Validate configuration.
pub fn validate(config_path: Option<&Path>) -> Result<ExitCode> {
    match load_config(config_path) {
        Ok(config) => {
            eprintln!(
                "{} Configuration is valid ({} checks enabled)",
                style("✓").green(),
                config.checks.enabled().len()
            );
            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: prgate init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            eprintln!("{} Configuration validation failed: {e}", style("✗").red());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Show configuration.
pub fn config(raw: bool, config_path: Option<&Path>) -> Result<ExitCode> {
    let found = match config_path {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        None => Config::find_config_file(),
    };

    match found {
        Ok(path) => {
            eprintln!("Configuration file: {}", path.display());
            eprintln!();

            let content = if raw {
                std::fs::read_to_string(&path).map_err(|e| Error::io("read config", e))?
            } else {
                Config::load_from(&path)?.to_yaml()?
            };
            std::io::stdout()
                .write_all(content.as_bytes())
                .map_err(|e| Error::io("write output", e))?;

            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { .. }) => {
            eprintln!("{} No configuration file found", style("!").yellow());
            eprintln!("  Run: prgate init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e),
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "prgate",
        &mut std::io::stdout(),
    );
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn print_report(report: &Report, options: &DisplayOptions) {
    eprintln!();
    eprint!("{}", render::render_details(report, options));
    eprint!("{}", render::render_summary(report));
}

/// Drives a future to completion on a fresh runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create runtime: {e}"),
    })?;
    Ok(runtime.block_on(future))
}
