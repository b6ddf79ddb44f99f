//! Git repository operations.
//!
//! difflint needs the list of files changed against a target and an
//! ancestry test between two refs. Staged runs also hide unstaged edits of
//! partially staged files while linting, and stage what fixers rewrote.
//! All of it is expressed by the [`Vcs`] trait so the orchestration logic
//! can be driven without a real repository.

use crate::core::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The ref every ancestry check is made against.
pub const HEAD: &str = "HEAD";

/// Only added, copied, modified and renamed files are linted.
const DIFF_FILTER: &str = "--diff-filter=ACMR";

/// Where hidden unstaged changes are kept, relative to the git directory.
const UNSTAGED_PATCH: &str = "difflint-unstaged.patch";

/// What the changed-file set is computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// Files in the staged index.
    Staged,
    /// Files changed between a base ref and `HEAD`.
    Base(String),
}

impl DiffTarget {
    /// Arguments passed to `git diff` for this target.
    fn diff_args(&self) -> Vec<String> {
        let mut args = vec!["diff".to_string()];
        match self {
            Self::Staged => args.push("--staged".to_string()),
            Self::Base(base) => args.push(format!("{base}..{HEAD}")),
        }
        args.push("--name-only".to_string());
        args.push("-z".to_string());
        args.push(DIFF_FILTER.to_string());
        args
    }
}

impl std::fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staged => write!(f, "staged files"),
            Self::Base(base) => write!(f, "{base}..{HEAD}"),
        }
    }
}

/// Version-control operations the orchestrator depends on.
pub trait Vcs {
    /// Lists files changed against `target`, relative to the repository root.
    fn changed_files(&self, target: &DiffTarget) -> Result<Vec<PathBuf>>;

    /// Returns true if `ancestor` is reachable from `descendant`.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Lists files whose working-tree copy differs from the index.
    fn unstaged_files(&self) -> Result<Vec<PathBuf>>;

    /// Saves the unstaged changes of `files` as a patch and resets their
    /// working-tree copies to the index. Returns where the patch was saved.
    fn hide_unstaged(&self, files: &[PathBuf]) -> Result<PathBuf>;

    /// Reapplies a patch saved by [`Vcs::hide_unstaged`] and removes it.
    ///
    /// If the patch no longer applies it is left in place and an error
    /// names it.
    fn restore_unstaged(&self, patch: &Path) -> Result<()>;

    /// Adds the working-tree copies of `files` to the index.
    fn stage(&self, files: &[PathBuf]) -> Result<()>;
}

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = stdout
            .lines()
            .next()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs git in the repository root and returns its stdout.
    fn run<I, S>(&self, operation: &str, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io(format!("run git {operation}"), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(operation, stderr.trim().to_string()));
        }

        Ok(output.stdout)
    }

    /// Resolves a path inside the git directory.
    fn git_path(&self, name: &str) -> Result<PathBuf> {
        let stdout = self.run("rev-parse", ["rev-parse", "--git-path", name])?;
        let relative = String::from_utf8_lossy(&stdout).trim().to_string();
        Ok(self.root.join(relative))
    }
}

/// Splits NUL-separated `git -z` output into paths, keeping the raw bytes.
fn split_paths(stdout: &[u8]) -> Vec<PathBuf> {
    stdout
        .split(|byte| *byte == 0)
        .filter(|name| !name.is_empty())
        .map(path_from_bytes)
        .collect()
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

impl Vcs for GitRepo {
    fn changed_files(&self, target: &DiffTarget) -> Result<Vec<PathBuf>> {
        let stdout = self.run("diff", target.diff_args())?;
        let files = split_paths(&stdout);

        tracing::debug!(target = %target, count = files.len(), "Collected changed files");

        Ok(files)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let status = Command::new("git")
            .args(["merge-base", "--is-ancestor", ancestor, descendant])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("run git merge-base", e))?
            .status;

        Ok(status.success())
    }

    fn unstaged_files(&self) -> Result<Vec<PathBuf>> {
        let stdout = self.run("diff", ["diff", "--name-only", "-z"])?;
        Ok(split_paths(&stdout))
    }

    fn hide_unstaged(&self, files: &[PathBuf]) -> Result<PathBuf> {
        let path = self.git_path(UNSTAGED_PATCH)?;
        if path.exists() {
            return Err(Error::git(
                "hide unstaged changes",
                format!(
                    "{} exists from an earlier run; apply it with `git apply` or remove it",
                    path.display()
                ),
            ));
        }

        let mut args: Vec<&OsStr> = [
            "diff",
            "--binary",
            "--unified=0",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            "--",
        ]
        .iter()
        .copied()
        .map(OsStr::new)
        .collect();
        args.extend(files.iter().map(|file| file.as_os_str()));
        let patch = self.run("diff", args)?;

        std::fs::write(&path, patch).map_err(|e| Error::io("save unstaged changes", e))?;

        let mut args: Vec<&OsStr> = vec![OsStr::new("checkout"), OsStr::new("--")];
        args.extend(files.iter().map(|file| file.as_os_str()));
        self.run("checkout", args)?;

        tracing::debug!(files = files.len(), patch = %path.display(), "Hid unstaged changes");

        Ok(path)
    }

    fn restore_unstaged(&self, patch: &Path) -> Result<()> {
        let applied = self.run(
            "apply",
            [
                OsStr::new("apply"),
                OsStr::new("--whitespace=nowarn"),
                OsStr::new("--recount"),
                OsStr::new("--unidiff-zero"),
                patch.as_os_str(),
            ],
        );

        match applied {
            Ok(_) => {},
            Err(Error::GitOperation { operation, message }) => {
                return Err(Error::GitOperation {
                    operation,
                    message: format!(
                        "{message}; unstaged changes are saved in {}",
                        patch.display()
                    ),
                });
            },
            Err(e) => return Err(e),
        }

        std::fs::remove_file(patch).map_err(|e| Error::io("remove unstaged patch", e))?;
        tracing::debug!("Restored unstaged changes");

        Ok(())
    }

    fn stage(&self, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let mut args: Vec<&OsStr> = vec![OsStr::new("add"), OsStr::new("--")];
        args.extend(files.iter().map(|file| file.as_os_str()));
        self.run("add", args)?;

        tracing::debug!(files = files.len(), "Staged fixed files");

        Ok(())
    }
}
