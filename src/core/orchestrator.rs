//! Top-level lint flow: pick a mode, collect files, dispatch, aggregate.

// Allow this for Rust 2024 compatibility - the drop order change is harmless here
#![allow(tail_expr_drop_order)]

use crate::config::Config;
use crate::core::dispatch::{all_commands, diff_table, DispatchEntry};
use crate::core::error::Result;
use crate::core::git::{DiffTarget, Vcs};
use crate::core::mode::{select_mode, Mode, Options, Selection, SelectionReason};
use crate::core::runner::{CommandResult, RunResult, Runner};
use console::style;
use std::path::PathBuf;
use std::time::Instant;

/// Drives one lint invocation against a repository.
#[derive(Debug)]
pub struct Orchestrator<V> {
    config: Config,
    vcs: V,
    root: PathBuf,
}

impl<V: Vcs> Orchestrator<V> {
    /// Creates an orchestrator whose commands run in `root`.
    pub fn new(config: Config, vcs: V, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            vcs,
            root: root.into(),
        }
    }

    /// Selects the mode for `options`, announcing an auto-detected base.
    pub fn select_mode(&self, options: &Options) -> Result<Selection> {
        let selection = select_mode(options, &self.vcs, &self.config.base_branches)?;

        if let (SelectionReason::ResolvedBase, Mode::Diff(base)) =
            (selection.reason, &selection.mode)
        {
            eprintln!("{} Base branch: {}", style("•").cyan(), style(base).bold());
        }

        Ok(selection)
    }

    /// Runs the linters selected by `options`.
    ///
    /// Fatal problems (conflicting flags, no base branch, git failures) are
    /// errors; linter failures are reported in the result.
    pub async fn run(&self, options: &Options) -> Result<RunResult> {
        let selection = self.select_mode(options)?;

        match selection.mode.diff_target() {
            None => self.run_all(options.fix).await,
            Some(target) => self.run_diff(selection.mode, &target, options.fix).await,
        }
    }

    /// Runs the whole-repository commands in order.
    pub async fn run_all(&self, fix: bool) -> Result<RunResult> {
        let start = Instant::now();
        let commands = all_commands(&self.config, fix);

        tracing::debug!(commands = commands.len(), fix, "Linting all files");

        let results = self.runner().run_whole_tree(&commands).await?;

        Ok(RunResult {
            mode: Mode::All,
            files: None,
            commands: results,
            duration: start.elapsed(),
        })
    }

    /// Runs the dispatch table against the files in `target`.
    ///
    /// Entries run concurrently when checking and one after another when
    /// fixing, so fixers never rewrite the same file at once. Staged runs
    /// lint the index content: unstaged edits of partially staged files are
    /// hidden for the duration, and a passing fix run stages the files the
    /// table matched.
    pub async fn run_diff(&self, mode: Mode, target: &DiffTarget, fix: bool) -> Result<RunResult> {
        let start = Instant::now();
        let table = diff_table(&self.config, fix)?;
        let files = self.vcs.changed_files(target)?;
        let staged = mode == Mode::Staged && !files.is_empty();

        tracing::debug!(target = %target, files = files.len(), fix, "Linting changed files");

        let hidden = if staged {
            self.hide_unstaged(&files)?
        } else {
            None
        };

        let results = self.runner().run_changed(&files, &table, !fix).await;

        let restaged = match &results {
            Ok(commands) if staged && fix && commands.iter().all(CommandResult::passed) => {
                self.vcs.stage(&matched_files(&files, &table))
            },
            _ => Ok(()),
        };

        let restored = match hidden {
            Some(patch) => self.vcs.restore_unstaged(&patch),
            None => Ok(()),
        };

        let results = results?;
        restaged?;
        restored?;

        Ok(RunResult {
            mode,
            files: Some(files.len()),
            commands: results,
            duration: start.elapsed(),
        })
    }

    /// Hides the unstaged edits of staged files, if any have them.
    fn hide_unstaged(&self, staged: &[PathBuf]) -> Result<Option<PathBuf>> {
        let unstaged = self.vcs.unstaged_files()?;
        let partial: Vec<PathBuf> = staged
            .iter()
            .filter(|file| unstaged.contains(file))
            .cloned()
            .collect();

        if partial.is_empty() {
            return Ok(None);
        }

        eprintln!(
            "{} Hiding unstaged changes in {} partially staged file(s)",
            style("•").cyan(),
            partial.len()
        );

        self.vcs.hide_unstaged(&partial).map(Some)
    }

    fn runner(&self) -> Runner {
        Runner::new(&self.root, self.config.max_arg_length)
    }
}

/// Files matched by at least one entry, in file-set order.
fn matched_files(files: &[PathBuf], table: &[DispatchEntry]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|file| table.iter().any(|entry| entry.pattern.matches(file)))
        .cloned()
        .collect()
}
