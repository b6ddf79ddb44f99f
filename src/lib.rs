//! # difflint
//!
//! Lint only the files you changed.
//!
//! `difflint` works out which files differ from a base branch (or are staged),
//! matches them against a pattern-keyed dispatch table and runs every linter
//! whose pattern matches, in check or fix mode. `--all` runs whole-repository
//! commands instead. The exit status is 0 only when every linter passed.
//!
//! ## Features
//!
//! - **Mode validation**: `--all`, `--staged` and `--base` collapse into one
//!   [`Mode`]; `--base` with `--staged` is rejected before anything runs
//! - **Base branch detection**: the first configured candidate that is an
//!   ancestor of HEAD is used
//! - **Dispatch tables**: every matching entry runs, in table order; commands
//!   are static or computed from the matched files
//! - **Concurrent checks**: entries run in parallel when checking and one
//!   after another when fixing
//!
//! ## Example
//!
//! ```rust,no_run
//! use difflint::{Config, GitRepo, Options, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> difflint::Result<()> {
//!     let config = Config::load_or_default()?;
//!     let repo = GitRepo::discover()?;
//!     let root = repo.root().to_path_buf();
//!
//!     let options = Options {
//!         staged: true,
//!         ..Options::default()
//!     };
//!     let result = Orchestrator::new(config, repo, root).run(&options).await?;
//!
//!     if !result.success() {
//!         std::process::exit(1);
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/difflint/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cli;
pub mod config;
pub mod core;

// Re-export main types for convenience
pub use crate::config::Config;
pub use crate::core::dispatch::{Command, DispatchEntry};
pub use crate::core::error::{Error, Result};
pub use crate::core::git::{DiffTarget, GitRepo, Vcs};
pub use crate::core::mode::{Mode, Options};
pub use crate::core::orchestrator::Orchestrator;
pub use crate::core::runner::{CommandResult, RunResult, Runner};
