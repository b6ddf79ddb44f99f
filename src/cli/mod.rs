//! Command-line interface for difflint.
//!
//! Without a subcommand `difflint` lints; the flags select what:
//! - `--all`: every file, via the whole-repository commands
//! - `--staged`: files staged in the index
//! - `--base <ref>`: files changed between `<ref>` and HEAD
//! - (none): like `--base`, with the base branch detected automatically
//!
//! Subcommands:
//! - `list`: Show the dispatch tables
//! - `init`: Write a default configuration
//! - `validate`: Validate configuration
//! - `completions`: Generate shell completions

mod commands;

use crate::core::error::Result;
use crate::core::mode::Options;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Lint only the files you changed.
#[derive(Debug, Parser)]
#[command(
    name = "difflint",
    author,
    version,
    about = "Lint only the files you changed",
    long_about = r#"
Lint only the files you changed.

The default command checks for code style issues in the modified files of
the current branch. It identifies the changed files, matches them against the
dispatch table, and runs the corresponding linters. Use it to ensure code
quality before committing or pushing changes.

Examples:
  difflint              # files changed since the detected base branch
  difflint --staged     # files staged for commit
  difflint -b v1.4.0    # files changed since a tag
  difflint --all --fix  # fix the whole repository

Exit status is 0 when every linter passed and 1 otherwise.
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Lint flags, used when no subcommand is given.
    #[command(flatten)]
    pub lint: LintArgs,

    /// Configuration file to use instead of searching for difflint.toml.
    #[arg(short = 'C', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Flags of the default lint command.
///
/// `--base` and `--staged` are validated together with the repository
/// state, not by the parser, so a conflict exits with status 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct LintArgs {
    /// Lint all files in the repository.
    #[arg(short, long)]
    pub all: bool,

    /// Base branch to compare against.
    #[arg(short, long, value_name = "REF")]
    pub base: Option<String>,

    /// Use staged files instead of the branch diff.
    #[arg(short, long)]
    pub staged: bool,

    /// Automatically fix problems.
    #[arg(short, long)]
    pub fix: bool,
}

impl From<LintArgs> for Options {
    fn from(args: LintArgs) -> Self {
        Self {
            all: args.all,
            base: args.base,
            staged: args.staged,
            fix: args.fix,
        }
    }
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show which linters run for which files.
    #[command(visible_alias = "l")]
    List {
        /// Show the fix commands instead of the checks.
        #[arg(short, long)]
        fix: bool,

        /// Print the tables as JSON on stdout.
        #[arg(long)]
        json: bool,
    },

    /// Write a default difflint.toml.
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration file.
    #[command(visible_alias = "v")]
    Validate,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    setup_logging(cli.verbose, cli.quiet);

    // Set up color
    setup_color(cli.color);

    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::List { fix, json }) => commands::list(config, fix, json),
        Some(Commands::Init { force }) => commands::init(force),
        Some(Commands::Validate) => commands::validate(config),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        None => commands::lint(config, &cli.lint.into()),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {
            // Let console crate auto-detect
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_parsing_help() {
        let cli = Cli::try_parse_from(["difflint", "--help"]);
        // --help causes early exit, so this will be an error
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_version() {
        let cli = Cli::try_parse_from(["difflint", "--version"]);
        assert!(cli.is_err()); // --version causes early exit
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    // =========================================================================
    // Lint flag tests
    // =========================================================================

    #[test]
    fn test_parse_no_flags() {
        let cli = Cli::try_parse_from(["difflint"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.lint, LintArgs::default());
    }

    #[test]
    fn test_parse_long_flags() {
        let cli = Cli::try_parse_from(["difflint", "--all", "--fix"]).expect("parse");
        assert_eq!(
            Options::from(cli.lint),
            Options {
                all: true,
                fix: true,
                ..Options::default()
            }
        );
    }

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["difflint", "-b", "origin/dev", "-f"]).expect("parse");
        assert_eq!(cli.lint.base.as_deref(), Some("origin/dev"));
        assert!(cli.lint.fix);
        assert!(!cli.lint.staged);

        let cli = Cli::try_parse_from(["difflint", "-s", "-a"]).expect("parse");
        assert!(cli.lint.staged);
        assert!(cli.lint.all);
    }

    #[test]
    fn test_parse_base_and_staged_is_left_to_validation() {
        let cli = Cli::try_parse_from(["difflint", "--base", "main", "--staged"]).expect("parse");
        let options = Options::from(cli.lint);
        assert_eq!(options.base.as_deref(), Some("main"));
        assert!(options.staged);
    }

    #[test]
    fn test_parse_base_requires_value() {
        let result = Cli::try_parse_from(["difflint", "--base"]);
        assert!(result.is_err());
    }

    // =========================================================================
    // Subcommand parsing tests
    // =========================================================================

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from(["difflint", "init"]).expect("parse init");
        assert!(matches!(cli.command, Some(Commands::Init { force: false })));
    }

    #[test]
    fn test_parse_init_with_force() {
        let cli = Cli::try_parse_from(["difflint", "init", "--force"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Init { force: true })));
    }

    #[test]
    fn test_parse_init_alias() {
        let cli = Cli::try_parse_from(["difflint", "i"]).expect("parse init alias");
        assert!(matches!(cli.command, Some(Commands::Init { .. })));
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::try_parse_from(["difflint", "list"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                fix: false,
                json: false
            })
        ));
    }

    #[test]
    fn test_parse_list_fix_json() {
        let cli = Cli::try_parse_from(["difflint", "list", "--fix", "--json"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                fix: true,
                json: true
            })
        ));
        // The subcommand's --fix is its own flag.
        assert!(!cli.lint.fix);
    }

    #[test]
    fn test_parse_list_alias() {
        let cli = Cli::try_parse_from(["difflint", "l"]).expect("parse list alias");
        assert!(matches!(cli.command, Some(Commands::List { .. })));
    }

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from(["difflint", "validate"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Validate)));
    }

    #[test]
    fn test_parse_completions() {
        for shell in ["bash", "zsh", "fish"] {
            let cli = Cli::try_parse_from(["difflint", "completions", shell]).expect("parse");
            assert!(matches!(cli.command, Some(Commands::Completions { .. })));
        }
    }

    // =========================================================================
    // Global flags tests
    // =========================================================================

    #[test]
    fn test_parse_verbose_flag() {
        let cli = Cli::try_parse_from(["difflint", "--verbose", "list"]).expect("parse");
        assert!(cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_quiet_flag() {
        let cli = Cli::try_parse_from(["difflint", "-q", "--staged"]).expect("parse");
        assert!(cli.quiet);
        assert!(cli.lint.staged);
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["difflint", "-C", "ci/difflint.toml", "-a"]).expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("ci/difflint.toml")));

        let cli = Cli::try_parse_from(["difflint", "list", "--config", "x.toml"]).expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_parse_color() {
        let cli = Cli::try_parse_from(["difflint", "--color", "never"]).expect("parse");
        assert_eq!(cli.color, ColorChoice::Never);

        let cli = Cli::try_parse_from(["difflint"]).expect("parse");
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn test_parse_invalid_color() {
        let result = Cli::try_parse_from(["difflint", "--color", "sometimes"]);
        assert!(result.is_err());
    }
}
