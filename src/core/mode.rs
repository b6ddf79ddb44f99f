//! Lint mode selection.
//!
//! The four CLI flags collapse into exactly one [`Mode`]. Flags that cannot
//! be combined are rejected here, before anything touches git or spawns a
//! linter, and everything downstream matches on the mode exhaustively.

use crate::core::error::{Error, Result};
use crate::core::git::{DiffTarget, Vcs};
use crate::core::resolver::resolve_base_branch;

/// Raw lint flags as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Lint the whole repository.
    pub all: bool,
    /// Ref to diff against.
    pub base: Option<String>,
    /// Lint staged files.
    pub staged: bool,
    /// Run fix variants instead of checks.
    pub fix: bool,
}

impl Options {
    /// Rejects flag combinations that cannot select a mode.
    ///
    /// Needs neither a repository nor a configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.all && self.base.is_some() && self.staged {
            return Err(Error::MutuallyExclusive);
        }
        Ok(())
    }
}

/// Which files a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Every file, via the whole-repository commands.
    All,
    /// Files staged in the index.
    Staged,
    /// Files changed between the given ref and HEAD.
    Diff(String),
}

impl Mode {
    /// Validates `options` and returns the mode they select.
    ///
    /// See [`select_mode`] for the rules.
    pub fn from_options<V: Vcs + ?Sized>(
        options: &Options,
        vcs: &V,
        candidates: &[String],
    ) -> Result<Self> {
        select_mode(options, vcs, candidates).map(|selection| selection.mode)
    }

    /// Returns a short name for the mode.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Staged => "staged",
            Self::Diff(_) => "diff",
        }
    }

    /// Returns the diff to list changed files from, or `None` for [`Mode::All`].
    #[must_use]
    pub fn diff_target(&self) -> Option<DiffTarget> {
        match self {
            Self::All => None,
            Self::Staged => Some(DiffTarget::Staged),
            Self::Diff(base) => Some(DiffTarget::Base(base.clone())),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all files"),
            Self::Staged => write!(f, "staged files"),
            Self::Diff(base) => write!(f, "changes since {base}"),
        }
    }
}

/// Why a mode was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// `--all` was given.
    AllFlag,
    /// `--staged` was given.
    StagedFlag,
    /// `--base` was given.
    ExplicitBase,
    /// No scope flag; the base branch was found by probing candidates.
    ResolvedBase,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllFlag => write!(f, "--all"),
            Self::StagedFlag => write!(f, "--staged"),
            Self::ExplicitBase => write!(f, "--base"),
            Self::ResolvedBase => write!(f, "auto-detected base branch"),
        }
    }
}

/// Result of mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The selected mode.
    pub mode: Mode,
    /// Reason for the selection.
    pub reason: SelectionReason,
}

/// Turns lint flags into a mode.
///
/// `--all` wins over everything else. `--base` together with `--staged` is an
/// error. With no scope flag the base branch is resolved from `candidates`,
/// which is the only case that queries `vcs`.
pub fn select_mode<V: Vcs + ?Sized>(
    options: &Options,
    vcs: &V,
    candidates: &[String],
) -> Result<Selection> {
    options.validate()?;

    let (mode, reason) = if options.all {
        (Mode::All, SelectionReason::AllFlag)
    } else {
        match (&options.base, options.staged) {
            (_, true) => (Mode::Staged, SelectionReason::StagedFlag),
            (Some(base), false) => (Mode::Diff(base.clone()), SelectionReason::ExplicitBase),
            (None, false) => (
                Mode::Diff(resolve_base_branch(vcs, candidates)?),
                SelectionReason::ResolvedBase,
            ),
        }
    };

    tracing::debug!(mode = %mode, reason = %reason, "Selected lint mode");
    Ok(Selection { mode, reason })
}
