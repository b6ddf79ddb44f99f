//! Job planning and execution for dispatch tables.
//!
//! A dispatch table and a file set are turned into jobs: one group per table
//! entry that matched anything, each group holding the shell invocations for
//! that entry. Groups run concurrently when allowed; jobs within a group
//! always run in order. Every job is reported as it finishes and its exit
//! status is kept for the final verdict.

// Allow this for Rust 2024 compatibility - the drop order change is harmless here
#![allow(tail_expr_drop_order)]

use crate::core::dispatch::{Command, DispatchEntry};
use crate::core::error::{Error, Result};
use crate::core::executor::{CommandOutput, ExecuteOptions, Executor};
use crate::core::mode::Mode;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Result of running a single command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Display name of the linter.
    pub label: String,
    /// The exact command line that ran.
    pub command: String,
    /// Number of files handed to the command (0 for whole-tree runs).
    pub files: usize,
    /// Output from the command.
    pub output: CommandOutput,
}

impl CommandResult {
    /// Returns true if the command exited with status 0.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.output.success()
    }
}

/// Result of a whole invocation.
#[derive(Debug)]
pub struct RunResult {
    /// Mode that was used.
    pub mode: Mode,
    /// Size of the changed-file set; `None` for whole-tree runs.
    pub files: Option<usize>,
    /// Individual command results, in table order.
    pub commands: Vec<CommandResult>,
    /// Total duration.
    pub duration: Duration,
}

impl RunResult {
    /// Returns true if every command passed. An empty run passes.
    #[must_use]
    pub fn success(&self) -> bool {
        self.commands.iter().all(CommandResult::passed)
    }

    /// Returns the number of passed commands.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.commands.iter().filter(|c| c.passed()).count()
    }

    /// Returns the number of failed commands.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.commands.iter().filter(|c| !c.passed()).count()
    }

    /// Returns failed command results.
    pub fn failed_commands(&self) -> impl Iterator<Item = &CommandResult> {
        self.commands.iter().filter(|c| !c.passed())
    }
}

/// One planned shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Display name of the linter.
    pub label: String,
    /// Full command line, file arguments included.
    pub command: String,
    /// Number of files the invocation covers.
    pub files: usize,
}

/// Plans the jobs for every entry that matched at least one file.
///
/// The outer vector follows table order; entries with no matches are left
/// out.
#[must_use]
pub fn plan(table: &[DispatchEntry], files: &[PathBuf], max_arg_length: usize) -> Vec<Vec<Job>> {
    table
        .iter()
        .map(|entry| plan_entry(entry, files, max_arg_length))
        .filter(|jobs| !jobs.is_empty())
        .collect()
}

fn plan_entry(entry: &DispatchEntry, files: &[PathBuf], max_arg_length: usize) -> Vec<Job> {
    let matched = entry.matching(files);
    if matched.is_empty() {
        return Vec::new();
    }

    match &entry.command {
        Command::Static(base) => chunk_arguments(base.len(), quote_all(&matched), max_arg_length)
            .into_iter()
            .map(|chunk| Job {
                label: entry.label.clone(),
                command: format!("{base} {}", chunk.join(" ")),
                files: chunk.len(),
            })
            .collect(),
        Command::Computed(compute) => {
            let matched: Vec<PathBuf> = matched.iter().map(|p| p.to_path_buf()).collect();
            vec![Job {
                label: entry.label.clone(),
                command: compute(matched.as_slice()),
                files: matched.len(),
            }]
        },
    }
}

fn quote_all(files: &[&Path]) -> Vec<String> {
    files.iter().map(|file| quote_path(file)).collect()
}

/// Quotes a path for `sh`.
///
/// Names that are not UTF-8 are rebuilt byte for byte with `printf` octal
/// escapes.
fn quote_path(file: &Path) -> String {
    match file.to_str() {
        Some(name) => shell_words::quote(name).into_owned(),
        None => quote_raw(file),
    }
}

#[cfg(unix)]
fn quote_raw(file: &Path) -> String {
    use std::os::unix::ffi::OsStrExt;

    let mut escaped = String::new();
    for byte in file.as_os_str().as_bytes() {
        if byte.is_ascii_alphanumeric() || b"._/".contains(byte) {
            escaped.push(char::from(*byte));
        } else {
            escaped.push_str(&format!("\\{byte:03o}"));
        }
    }
    format!("\"$(printf '{escaped}')\"")
}

#[cfg(not(unix))]
fn quote_raw(file: &Path) -> String {
    shell_words::quote(&file.to_string_lossy()).into_owned()
}

/// Splits arguments so `base + args` stays within `max_len` bytes.
///
/// A single argument that alone exceeds the limit still gets its own chunk.
fn chunk_arguments(base_len: usize, args: Vec<String>, max_len: usize) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut len = base_len;

    for arg in args {
        let added = arg.len() + 1;
        if !current.is_empty() && len + added > max_len {
            chunks.push(std::mem::take(&mut current));
            len = base_len;
        }
        len += added;
        current.push(arg);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Runs linter commands in a working tree.
#[derive(Debug, Clone)]
pub struct Runner {
    root: PathBuf,
    max_arg_length: usize,
}

impl Runner {
    /// Creates a runner whose commands execute in `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_arg_length: usize) -> Self {
        Self {
            root: root.into(),
            max_arg_length,
        }
    }

    /// Runs whole-repository commands one after another, streaming output.
    ///
    /// A failing command does not stop the ones after it.
    pub async fn run_whole_tree(&self, commands: &[String]) -> Result<Vec<CommandResult>> {
        let executor = Executor::new();
        let options = ExecuteOptions::default()
            .cwd(&self.root)
            .capture_output(false);

        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            eprintln!("{} Running: {}", style("•").cyan(), style(command).bold());

            let output = executor.execute(command, &options).await?;
            let result = CommandResult {
                label: program_name(command).to_string(),
                command: command.clone(),
                files: 0,
                output,
            };

            eprint!("{}", render(&result));
            results.push(result);
        }

        Ok(results)
    }

    /// Runs the table against the changed files.
    ///
    /// An empty file set is a successful no-op.
    pub async fn run_changed(
        &self,
        files: &[PathBuf],
        table: &[DispatchEntry],
        concurrent: bool,
    ) -> Result<Vec<CommandResult>> {
        if files.is_empty() {
            eprintln!("{} No changed files found", style("•").cyan());
            return Ok(Vec::new());
        }

        let groups = plan(table, files, self.max_arg_length);
        tracing::debug!(
            files = files.len(),
            groups = groups.len(),
            concurrent,
            "Planned lint jobs"
        );

        let progress = spinner(files.len());
        let options = ExecuteOptions::default().cwd(&self.root);

        let results = if concurrent {
            run_concurrent(groups, &options, &progress).await
        } else {
            run_serial(groups, &options, &progress).await
        };

        progress.finish_and_clear();
        results
    }
}

/// Runs groups one at a time, in table order.
async fn run_serial(
    groups: Vec<Vec<Job>>,
    options: &ExecuteOptions,
    progress: &ProgressBar,
) -> Result<Vec<CommandResult>> {
    let mut results = Vec::new();
    for jobs in groups {
        results.extend(run_group(jobs, options.clone(), progress.clone()).await?);
    }
    Ok(results)
}

/// Runs groups concurrently, bounded by the available parallelism.
///
/// Results are collected in table order regardless of completion order.
async fn run_concurrent(
    groups: Vec<Vec<Job>>,
    options: &ExecuteOptions,
    progress: &ProgressBar,
) -> Result<Vec<CommandResult>> {
    let semaphore = Arc::new(Semaphore::new(concurrency::available_parallelism()));
    let mut tasks = JoinSet::new();

    for (index, jobs) in groups.into_iter().enumerate() {
        let sem = Arc::clone(&semaphore);
        let options = options.clone();
        let progress = progress.clone();

        tasks.spawn(async move {
            let group = match sem.acquire_owned().await {
                Ok(_permit) => run_group(jobs, options, progress).await,
                Err(_) => Err(Error::Internal {
                    message: "Semaphore closed unexpectedly".to_string(),
                }),
            };
            (index, group)
        });
    }

    collect_in_order(tasks).await
}

/// Waits for every group and flattens their results in table order.
///
/// The first error drops the set, which aborts the groups still running.
async fn collect_in_order(
    mut tasks: JoinSet<(usize, Result<Vec<CommandResult>>)>,
) -> Result<Vec<CommandResult>> {
    let mut groups = Vec::with_capacity(tasks.len());

    while let Some(joined) = tasks.join_next().await {
        let (index, group) = joined.map_err(|e| Error::Internal {
            message: format!("Task join error: {e}"),
        })?;
        groups.push((index, group?));
    }

    groups.sort_by_key(|(index, _)| *index);
    Ok(groups.into_iter().flat_map(|(_, group)| group).collect())
}

/// Runs the jobs of one entry in order.
async fn run_group(
    jobs: Vec<Job>,
    options: ExecuteOptions,
    progress: ProgressBar,
) -> Result<Vec<CommandResult>> {
    let executor = Executor::new();
    let mut results = Vec::with_capacity(jobs.len());

    for job in jobs {
        tracing::debug!(command = %job.command, "Running lint job");

        let output = executor.execute(&job.command, &options).await?;
        let result = CommandResult {
            label: job.label,
            command: job.command,
            files: job.files,
            output,
        };

        progress.suspend(|| eprint!("{}", render(&result)));
        results.push(result);
    }

    Ok(results)
}

/// Formats a status line plus any captured output, indented.
fn render(result: &CommandResult) -> String {
    let mark = if result.passed() {
        style("✓").green()
    } else {
        style("✗").red()
    };

    let mut text = match result.files {
        0 => format!("{mark} {}", result.label),
        1 => format!("{mark} {} (1 file)", result.label),
        n => format!("{mark} {} ({n} files)", result.label),
    };
    if !result.passed() {
        text.push_str(&format!(" exited with {}", result.output.exit_code));
    }
    text.push('\n');

    for line in result.output.combined_output().lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }

    text
}

/// First word of a command line.
fn program_name(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or(command)
}

fn spinner(files: usize) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .ok()
            .unwrap_or_else(ProgressStyle::default_spinner),
    );
    pb.set_message(format!("Linting {files} changed file(s)..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Concurrency utilities for parallel execution.
mod concurrency {
    /// Returns the number of available CPU cores for parallel execution.
    pub fn available_parallelism() -> usize {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
    }
}
