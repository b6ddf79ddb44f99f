//! CLI command implementations.

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::core::dispatch::diff_table;
use crate::core::error::{Error, Result};
use crate::core::executor::Executor;
use crate::core::git::GitRepo;
use crate::core::mode::Options;
use crate::core::orchestrator::Orchestrator;
use crate::core::runner::RunResult;
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Loads the configuration from `path`, or discovers it.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load_or_default(),
    }
}

/// Lint the selected files.
pub fn lint(config_path: Option<&Path>, options: &Options) -> Result<ExitCode> {
    options.validate()?;

    let config = load_config(config_path)?;
    let repo = GitRepo::discover()?;
    let root = repo.root().to_path_buf();

    let orchestrator = Orchestrator::new(config, repo, root);

    let result = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Internal {
            message: format!("Failed to create runtime: {e}"),
        })?
        .block_on(orchestrator.run(options))?;

    print_summary(&result);

    if result.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Prints the closing verdict of a lint run.
fn print_summary(result: &RunResult) {
    if result.commands.is_empty() {
        return;
    }

    let elapsed = humantime::format_duration(round_to_millis(result.duration));

    eprintln!();
    if result.success() {
        eprintln!(
            "{} All linters passed ({} command(s)) in {elapsed}",
            style("✓").green().bold(),
            result.passed_count(),
        );
    } else {
        eprintln!(
            "{} {} of {} command(s) failed in {elapsed}",
            style("✗").red().bold(),
            result.failed_count(),
            result.commands.len(),
        );

        for command in result.failed_commands() {
            eprintln!(
                "  {} {} (exit {})",
                style("Failed:").red(),
                command.label,
                command.output.exit_code
            );
        }
    }
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// One row of `list` output.
#[derive(Debug, Serialize)]
struct ListedCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    label: String,
    command: String,
    takes_files: bool,
    available: bool,
}

/// Everything `list` prints.
#[derive(Debug, Serialize)]
struct Listing {
    fix: bool,
    base_branches: Vec<String>,
    all: Vec<ListedCommand>,
    diff: Vec<ListedCommand>,
}

impl Listing {
    fn build(config: &Config, fix: bool) -> Result<Self> {
        let all = config
            .all
            .iter()
            .map(|command| {
                let line = command.command(fix).to_string();
                ListedCommand {
                    pattern: None,
                    label: command.label().to_string(),
                    available: is_available(&line),
                    command: line,
                    takes_files: false,
                }
            })
            .collect();

        let diff = diff_table(config, fix)?
            .into_iter()
            .map(|entry| {
                let line = entry.command.describe();
                ListedCommand {
                    pattern: Some(entry.pattern.as_str().to_string()),
                    label: entry.label,
                    available: is_available(&line),
                    takes_files: entry.command.takes_files(),
                    command: line,
                }
            })
            .collect();

        Ok(Self {
            fix,
            base_branches: config.base_branches.clone(),
            all,
            diff,
        })
    }
}

/// Returns true if the program a command line starts with is on `PATH`.
fn is_available(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .is_some_and(Executor::command_exists)
}

/// List the dispatch tables.
pub fn list(config_path: Option<&Path>, fix: bool, json: bool) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let listing = Listing::build(&config, fix)?;

    if json {
        let output = serde_json::to_string_pretty(&listing).map_err(|e| Error::Internal {
            message: format!("Failed to serialize listing: {e}"),
        })?;
        println!("{output}");
        return Ok(ExitCode::SUCCESS);
    }

    let variant = if fix { "fix" } else { "check" };

    eprintln!(
        "{} ({variant})",
        style("Whole repository (--all):").bold()
    );
    for command in &listing.all {
        print_command(command);
    }
    eprintln!();

    eprintln!(
        "{} ({variant})",
        style("Changed files (--staged, --base):").bold()
    );
    for command in &listing.diff {
        print_command(command);
    }
    eprintln!();

    eprintln!(
        "Base branch candidates: {}",
        listing.base_branches.join(", ")
    );

    Ok(ExitCode::SUCCESS)
}

/// Prints one table row.
fn print_command(command: &ListedCommand) {
    let marker = if command.available {
        style("✓").green()
    } else {
        style("✗").red()
    };

    let pattern = command
        .pattern
        .as_deref()
        .map(|p| format!("{} ", style(p).cyan()))
        .unwrap_or_default();

    let once = if command.pattern.is_some() && !command.takes_files {
        " (once)"
    } else {
        ""
    };

    eprintln!(
        "  {marker} {pattern}{} - {}{once}",
        style(&command.label).bold(),
        command.command
    );
}

/// Initialize configuration.
pub fn init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    // Check if config already exists
    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let toml = Config::default_toml()?;

    std::fs::write(&config_path, toml).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), config_path.display());

    eprintln!("\nNext steps:");
    eprintln!("  1. Point the [[all]] and [[diff]] commands at your linters");
    eprintln!("  2. Run: difflint --staged");

    Ok(ExitCode::SUCCESS)
}

/// Validate configuration.
pub fn validate(config_path: Option<&Path>) -> Result<ExitCode> {
    let found = match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::find_config_file(),
    };

    match found.and_then(|path| Config::load_from(&path).map(|_| path)) {
        Ok(path) => {
            eprintln!(
                "{} Configuration is valid: {}",
                style("✓").green(),
                path.display()
            );
            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: difflint init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            eprintln!("{} Configuration validation failed: {e}", style("✗").red());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "difflint",
        &mut std::io::stdout(),
    );
}
