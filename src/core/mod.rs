//! Core functionality for difflint.
//!
//! This module contains the main components:
//! - [`mode`]: Flag validation and lint mode selection
//! - [`resolver`]: Base branch auto-detection
//! - [`dispatch`]: Pattern to command dispatch tables
//! - [`runner`]: Job planning and execution engine
//! - [`orchestrator`]: End-to-end lint flow
//! - [`error`]: Error types and result handling
//! - [`git`]: Git repository operations

pub mod dispatch;
pub mod error;
pub mod executor;
pub mod git;
pub mod mode;
pub mod orchestrator;
pub mod pattern;
pub mod resolver;
pub mod runner;
