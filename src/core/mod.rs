//! Core functionality for prgate.
//!
//! This module contains the main components:
//! - [`detector`]: Mode detection (pull request, local, hook)
//! - [`runner`]: Check orchestration
//! - [`error`]: Error types and result handling
//! - [`git`]: Git repository operations and the local provider
//! - [`model`]: The data the checks look at
//! - [`provider`]: Data source and comment sink traits

pub mod detector;
pub mod error;
pub mod git;
pub mod model;
pub mod provider;
pub mod runner;
