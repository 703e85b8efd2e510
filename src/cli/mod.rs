//! Command-line interface for prgate.
//!
//! This module provides the `prgate` CLI with subcommands for:
//! - `run`: Check a pull request or the current branch
//! - `hook`: Check a commit message from the commit-msg hook
//! - `init`: Initialize configuration
//! - `install` / `uninstall`: Manage the commit-msg hook
//! - `detect`: Show the detected mode
//! - `list`: List configured checks
//! - `validate`: Validate configuration

mod commands;

use crate::core::error::Result;
use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Quality gate for pull requests and local Git history.
#[derive(Debug, Parser)]
#[command(
    name = "prgate",
    author,
    version,
    about = "Quality gate for pull requests and local Git history",
    long_about = r#"
prgate checks branch names, pull request titles and bodies, and commit
messages against the rules in .prgate.yml.

Against a pull request it runs every enabled check and posts a report
comment. Without one it checks the current branch, and as a commit-msg
hook it checks the commit being written.

Quick start:
  prgate init       # Create configuration
  prgate install    # Install the commit-msg hook
  prgate run --pr-url https://github.com/owner/repo/pull/1

Environment variables:
  PRGATE_PR_URL     Pull request to check
  GITHUB_TOKEN      Token for the GitHub API
  GITHUB_API_URL    GitHub API base URL
  PRGATE_SKIP=1     Skip the commit-msg hook
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Options of `prgate run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RunArgs {
    /// Pull request to check, e.g. https://github.com/owner/repo/pull/1.
    #[arg(long, value_name = "URL")]
    pub pr_url: Option<String>,

    /// CI page linked from the report comment.
    #[arg(long, value_name = "URL")]
    pub details_url: Option<String>,

    /// Run only this check (repeatable).
    #[arg(long = "only", value_name = "CHECK")]
    pub only: Vec<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the checks.
    #[command(visible_alias = "r")]
    Run(RunArgs),

    /// Check a commit message (used by the commit-msg hook).
    Hook {
        /// File holding the commit message; defaults to .git/COMMIT_EDITMSG.
        msg_file: Option<PathBuf>,
    },

    /// Initialize prgate configuration.
    #[command(visible_alias = "i")]
    Init {
        /// Use a preset configuration.
        #[arg(
            short,
            long,
            value_parser = PossibleValuesParser::new(crate::presets::available().iter().copied())
        )]
        preset: Option<String>,

        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Install the git commit-msg hook.
    Install {
        /// Overwrite an existing hook.
        #[arg(short, long)]
        force: bool,
    },

    /// Remove the git commit-msg hook.
    Uninstall,

    /// Show the detected mode and reasoning.
    #[command(visible_alias = "d")]
    Detect {
        /// Pull request URL, as passed to `run`.
        #[arg(long, value_name = "URL")]
        pr_url: Option<String>,
    },

    /// List the configured checks.
    #[command(visible_alias = "l")]
    List,

    /// Validate the configuration file.
    #[command(visible_alias = "v")]
    Validate,

    /// Show configuration file location and contents.
    Config {
        /// Print the file as written instead of the resolved configuration.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    setup_logging(cli.verbose, cli.quiet);

    // Set up color
    setup_color(cli.color);

    let config_path = cli.config_path.as_deref();

    // If no subcommand, run the default action (same as `prgate run`)
    match cli.command {
        Some(Commands::Run(args)) => commands::run(&args, config_path),
        Some(Commands::Hook { msg_file }) => commands::hook(msg_file, config_path),
        Some(Commands::Init { preset, force }) => commands::init(preset.as_deref(), force),
        Some(Commands::Install { force }) => commands::install(force),
        Some(Commands::Uninstall) => commands::uninstall(),
        Some(Commands::Detect { pr_url }) => commands::detect(pr_url.as_deref()),
        Some(Commands::List) => commands::list(config_path),
        Some(Commands::Validate) => commands::validate(config_path),
        Some(Commands::Config { raw }) => commands::config(raw, config_path),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        None => commands::run(&RunArgs::default(), config_path),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {
            // Let console crate auto-detect
        },
    }
}
