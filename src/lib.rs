//! # prgate
//!
//! A quality gate for pull requests and local Git history.
//!
//! prgate checks branch names, pull request titles and bodies, and commit
//! messages against a declarative configuration, reports the outcome on the
//! console or as a pull request comment, and fails the run when an
//! error-level rule is violated.
//!
//! ## Features
//!
//! - **Built-in checks**: branch name, PR title, PR body checklist, required
//!   and forbidden body text, and commit message format
//! - **Pull request mode**: reads the PR from the GitHub REST API and posts a
//!   Markdown report comment
//! - **Local mode**: checks the commits of the current branch
//! - **Commit-msg hook**: checks a commit message before it is recorded
//!
//! ## Example
//!
//! ```rust,no_run
//! use prgate::core::git::{GitRepo, LocalProvider, LocalSource};
//! use prgate::{Config, Detector, Runner};
//!
//! #[tokio::main]
//! async fn main() -> prgate::Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!
//!     // Detect mode (pull request, local, or hook)
//!     let mode = Detector::new(None).detect().mode;
//!
//!     // Run the checks against the current branch
//!     let runner = Runner::new(config, mode)?;
//!     let provider = LocalProvider::new(GitRepo::discover()?, LocalSource::Branch);
//!     let report = runner.run(&provider).await?;
//!
//!     if report.has_failures() {
//!         std::process::exit(1);
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/prgate/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod checks;
pub mod cli;
pub mod config;
pub mod core;
pub mod github;
pub mod presets;
pub mod report;

// Re-export main types for convenience
pub use checks::{CheckKind, CheckResult, Status};
pub use config::Config;
pub use core::detector::{Detector, Mode};
pub use core::error::{Error, Result};
pub use core::runner::Runner;
pub use report::Report;
