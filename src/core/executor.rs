//! Shell command execution for linter invocations.
//!
//! Every linter is an opaque shell command: difflint only looks at its exit
//! status. Output is either streamed straight to the console or captured so
//! concurrent jobs can print it as one block.

use crate::core::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Output from a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command. Termination by signal is reported as 1.
    pub exit_code: i32,
    /// Standard output (empty when streamed).
    pub stdout: String,
    /// Standard error (empty when streamed).
    pub stderr: String,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end(), self.stderr)
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<std::path::PathBuf>,
    /// Whether to capture output (vs streaming to console).
    pub capture_output: bool,
    /// Shell to use (default: sh on Unix, cmd on Windows).
    pub shell: Option<String>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            capture_output: true,
            shell: None,
        }
    }
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets whether to capture output.
    #[must_use]
    pub const fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }
}

/// Executor for running shell commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes a shell command and waits for it to finish.
    pub async fn execute(&self, command: &str, options: &ExecuteOptions) -> Result<CommandOutput> {
        let start = Instant::now();

        // Determine shell
        let (shell, shell_arg) = if cfg!(windows) {
            (options.shell.as_deref().unwrap_or("cmd"), "/C")
        } else {
            (options.shell.as_deref().unwrap_or("sh"), "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg).arg(command);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        if options.capture_output {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit());
            cmd.stderr(Stdio::inherit());
        }

        tracing::debug!(command = %command, capture = options.capture_output, "Spawning");

        let mut child = cmd.spawn().map_err(|e| Error::io("spawn command", e))?;

        let (exit_code, stdout, stderr) = if options.capture_output {
            let stdout = tokio::spawn(read_all(child.stdout.take()));
            let stderr = tokio::spawn(read_all(child.stderr.take()));

            let status = child.wait().await.map_err(|e| Error::io("wait for command", e))?;

            let stdout = stdout.await.map_err(|e| Error::Internal {
                message: format!("stdout task failed: {e}"),
            })?;
            let stderr = stderr.await.map_err(|e| Error::Internal {
                message: format!("stderr task failed: {e}"),
            })?;

            (status.code().unwrap_or(1), stdout, stderr)
        } else {
            let status = child.wait().await.map_err(|e| Error::io("wait for command", e))?;
            (status.code().unwrap_or(1), String::new(), String::new())
        };

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            duration: start.elapsed(),
        })
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// Drains a child pipe into a string, replacing invalid UTF-8.
async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut bytes = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut bytes).await {
            tracing::warn!(error = %e, "Failed to read command output");
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
