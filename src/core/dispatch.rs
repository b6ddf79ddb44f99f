//! Dispatch tables: which linter runs for which files.
//!
//! Two tables exist. `--all` runs a flat list of whole-repository commands.
//! Diff and staged runs use a pattern-keyed table in which every entry whose
//! pattern matches a file runs for it; entry order is execution order, not
//! priority.

use crate::config::{Config, Scope};
use crate::core::error::Result;
use crate::core::pattern::FilePattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds a command line from the files an entry matched.
pub type ComputeFn = dyn Fn(&[PathBuf]) -> String + Send + Sync;

/// A dispatch command.
#[derive(Clone)]
pub enum Command {
    /// Fixed command line; matched files are appended as arguments.
    Static(String),
    /// Command line computed from the matched files right before it runs.
    /// The result is used verbatim.
    Computed(Arc<ComputeFn>),
}

impl Command {
    /// Wraps a closure as a computed command.
    pub fn computed(compute: impl Fn(&[PathBuf]) -> String + Send + Sync + 'static) -> Self {
        Self::Computed(Arc::new(compute))
    }

    /// Returns a printable form of the command, as it would run without files.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Static(command) => command.clone(),
            Self::Computed(compute) => {
                let no_files: &[PathBuf] = &[];
                compute(no_files)
            },
        }
    }

    /// Returns true if matched files are appended to the command line.
    #[must_use]
    pub const fn takes_files(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(command) => f.debug_tuple("Static").field(command).finish(),
            Self::Computed(_) => f.debug_tuple("Computed").field(&"<fn>").finish(),
        }
    }
}

/// One pattern-keyed row of the changed-files table.
#[derive(Debug, Clone)]
pub struct DispatchEntry {
    /// Display name of the linter.
    pub label: String,
    /// Files this entry applies to.
    pub pattern: FilePattern,
    /// What to run for them.
    pub command: Command,
}

impl DispatchEntry {
    /// Creates an entry, compiling its pattern.
    pub fn new(label: impl Into<String>, pattern: &str, command: Command) -> Result<Self> {
        Ok(Self {
            label: label.into(),
            pattern: FilePattern::new(pattern)?,
            command,
        })
    }

    /// Returns the files this entry applies to, in input order.
    #[must_use]
    pub fn matching<'a>(&self, files: &'a [PathBuf]) -> Vec<&'a Path> {
        files
            .iter()
            .map(PathBuf::as_path)
            .filter(|file| self.pattern.matches(file))
            .collect()
    }
}

/// Whole-repository commands for `--all`, in execution order.
#[must_use]
pub fn all_commands(config: &Config, fix: bool) -> Vec<String> {
    config
        .all
        .iter()
        .map(|command| command.command(fix).to_string())
        .collect()
}

/// Pattern-keyed table for diff and staged runs.
pub fn diff_table(config: &Config, fix: bool) -> Result<Vec<DispatchEntry>> {
    config
        .diff
        .iter()
        .map(|entry| {
            let line = entry.command.command(fix).to_string();
            let command = match entry.scope {
                Scope::Files => Command::Static(line),
                Scope::Once => Command::computed(move |_| line.clone()),
            };
            DispatchEntry::new(entry.command.label(), &entry.pattern, command)
        })
        .collect()
}
