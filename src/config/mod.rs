//! Configuration handling for difflint.
//!
//! This module provides configuration loading and validation, supporting
//! both `difflint.toml` files and built-in defaults. The defaults describe a
//! Prettier + ESLint repository with a `studies/` tree checked by a
//! repository-specific `seed_tools` script.

use crate::core::error::{Error, Result};
use crate::core::pattern::FilePattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "difflint.toml";

/// Default cap on the length of one generated command line.
pub const DEFAULT_MAX_ARG_LENGTH: usize = 65_536;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Candidate base branches, tried in order when no base is given.
    pub base_branches: Vec<String>,
    /// Maximum length of a single command line built from file arguments.
    pub max_arg_length: usize,
    /// Whole-repository commands run by `--all`.
    pub all: Vec<LintCommand>,
    /// Pattern-keyed commands run against changed files.
    pub diff: Vec<DiffEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_branches: vec!["origin/main".to_string()],
            max_arg_length: DEFAULT_MAX_ARG_LENGTH,
            all: default_all_commands(),
            diff: default_diff_entries(),
        }
    }
}

impl Config {
    /// Loads configuration or returns defaults if not found.
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => {
                tracing::debug!("No {CONFIG_FILE_NAME} found, using built-in defaults");
                Ok(Self::default())
            },
            Err(e) => Err(e),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Finds the configuration file by searching up from the current directory.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        Self::find_config_file_from(&cwd)
    }

    /// Finds the configuration file by searching up from `start`.
    pub fn find_config_file_from(start: &Path) -> Result<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| Error::ConfigNotFound {
                path: start.join(CONFIG_FILE_NAME),
            })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_branches.is_empty() {
            return Err(Error::config_invalid(
                "base_branches",
                "At least one candidate branch is required",
            ));
        }

        if let Some(blank) = self.base_branches.iter().position(|b| b.trim().is_empty()) {
            return Err(Error::config_invalid(
                format!("base_branches[{blank}]"),
                "Branch name is empty",
            ));
        }

        if self.max_arg_length == 0 {
            return Err(Error::config_invalid(
                "max_arg_length",
                "Must be greater than zero",
            ));
        }

        for (index, command) in self.all.iter().enumerate() {
            command.validate(&format!("all[{index}]"))?;
        }

        for (index, entry) in self.diff.iter().enumerate() {
            entry.command.validate(&format!("diff[{index}]"))?;
            FilePattern::new(&entry.pattern)?;
        }

        Ok(())
    }

    /// Generates default configuration as a string.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })
    }
}

/// A linter invocation with its check and fix variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintCommand {
    /// Display name; defaults to the program name of `check`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Command run in check mode.
    pub check: String,
    /// Command run in fix mode; the check command is reused when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl LintCommand {
    /// Creates a command with distinct check and fix variants.
    #[must_use]
    pub fn new(name: &str, check: &str, fix: &str) -> Self {
        Self {
            name: name.to_string(),
            check: check.to_string(),
            fix: Some(fix.to_string()),
        }
    }

    /// Returns the command line for the requested mode.
    #[must_use]
    pub fn command(&self, fix: bool) -> &str {
        match (&self.fix, fix) {
            (Some(fix_command), true) => fix_command.as_str(),
            _ => self.check.as_str(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.check.split_whitespace().next().unwrap_or_default()
        } else {
            &self.name
        }
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.check.trim().is_empty() {
            return Err(Error::config_invalid(
                format!("{field}.check"),
                "Command is empty",
            ));
        }

        if self.fix.as_deref().is_some_and(|fix| fix.trim().is_empty()) {
            return Err(Error::config_invalid(
                format!("{field}.fix"),
                "Command is empty",
            ));
        }

        Ok(())
    }
}

/// How a diff entry's command receives the matched files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Matched files are appended to the command line.
    #[default]
    Files,
    /// The command runs once, without file arguments, if anything matched.
    Once,
}

/// A pattern-keyed entry of the changed-files table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DiffEntryFields")]
pub struct DiffEntry {
    /// Glob selecting the files this entry applies to.
    pub pattern: String,
    /// How matched files are handed to the command.
    #[serde(default)]
    pub scope: Scope,
    /// The command to run.
    #[serde(flatten)]
    pub command: LintCommand,
}

/// `[[diff]]` keys as written. Flattened fields skip
/// `deny_unknown_fields`, so the entry is read through this flat form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiffEntryFields {
    pattern: String,
    #[serde(default)]
    scope: Scope,
    #[serde(default)]
    name: String,
    check: String,
    #[serde(default)]
    fix: Option<String>,
}

impl From<DiffEntryFields> for DiffEntry {
    fn from(fields: DiffEntryFields) -> Self {
        Self {
            pattern: fields.pattern,
            scope: fields.scope,
            command: LintCommand {
                name: fields.name,
                check: fields.check,
                fix: fields.fix,
            },
        }
    }
}

/// Whole-repository commands.
fn default_all_commands() -> Vec<LintCommand> {
    vec![
        LintCommand::new(
            "prettier",
            "prettier . --ignore-unknown --check",
            "prettier . --ignore-unknown --write",
        ),
        LintCommand::new(
            "eslint",
            "eslint . --config src/.eslintrc.js",
            "eslint . --config src/.eslintrc.js --fix",
        ),
        LintCommand::new(
            "seed_tools",
            "npm run seed_tools lint --",
            "npm run seed_tools lint -- --fix",
        ),
    ]
}

/// Changed-file commands.
fn default_diff_entries() -> Vec<DiffEntry> {
    vec![
        DiffEntry {
            pattern: "*".to_string(),
            scope: Scope::Files,
            command: LintCommand::new(
                "prettier",
                "prettier --ignore-unknown --check",
                "prettier --ignore-unknown --write",
            ),
        },
        DiffEntry {
            pattern: "*.{ts,js,tsx,jsx}".to_string(),
            scope: Scope::Files,
            command: LintCommand::new(
                "eslint",
                "eslint --config src/.eslintrc.js",
                "eslint --config src/.eslintrc.js --fix",
            ),
        },
        DiffEntry {
            pattern: "studies/*".to_string(),
            scope: Scope::Once,
            command: LintCommand::new(
                "seed_tools",
                "npm run seed_tools lint --",
                "npm run seed_tools lint -- --fix",
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_branches, vec!["origin/main"]);
        assert_eq!(config.all.len(), 3);
        assert_eq!(config.diff.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lint_command_mode_selection() {
        let command = LintCommand::new("prettier", "prettier --check", "prettier --write");
        assert_eq!(command.command(false), "prettier --check");
        assert_eq!(command.command(true), "prettier --write");
    }

    #[test]
    fn test_lint_command_without_fix_reuses_check() {
        let command = LintCommand {
            name: String::new(),
            check: "shellcheck -x".to_string(),
            fix: None,
        };
        assert_eq!(command.command(true), "shellcheck -x");
        assert_eq!(command.label(), "shellcheck");
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml = Config::default_toml().expect("serialize defaults");
        assert!(toml.contains("[[all]]"));
        assert!(toml.contains("[[diff]]"));

        let parsed: Config = toml::from_str(&toml).expect("parse generated toml");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
base_branches = ["origin/develop", "origin/main"]
"#,
        )
        .expect("parse");

        assert_eq!(config.base_branches, vec!["origin/develop", "origin/main"]);
        assert_eq!(config.diff, default_diff_entries());
    }

    #[test]
    fn test_diff_entries_parse_scope_and_optional_fix() {
        let config: Config = toml::from_str(
            r#"
[[diff]]
pattern = "*.sh"
check = "shellcheck"

[[diff]]
pattern = "docs/*"
scope = "once"
name = "docs"
check = "make docs-check"
fix = "make docs-fix"
"#,
        )
        .expect("parse");

        assert_eq!(config.diff.len(), 2);
        assert_eq!(config.diff[0].scope, Scope::Files);
        assert_eq!(config.diff[0].command.fix, None);
        assert_eq!(config.diff[1].scope, Scope::Once);
        assert_eq!(config.diff[1].command.label(), "docs");
        assert_eq!(config.diff[1].command.command(true), "make docs-fix");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = toml::from_str::<Config>("base_branch = \"origin/main\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command_key_is_rejected() {
        let all = toml::from_str::<Config>(
            r#"
[[all]]
check = "eslint ."
fixx = "eslint . --fix"
"#,
        );
        assert!(all.is_err());

        let diff = toml::from_str::<Config>(
            r#"
[[diff]]
pattern = "*.ts"
check = "eslint"
fixx = "eslint --fix"
"#,
        );
        let message = diff.expect_err("unknown key").to_string();
        assert!(message.contains("fixx"), "{message}");
    }

    #[test]
    fn test_validate_empty_base_branches() {
        let config = Config {
            base_branches: vec![],
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { field, .. }) if field == "base_branches"
        ));
    }

    #[test]
    fn test_validate_blank_command() {
        let mut config = Config::default();
        config.diff[1].command.check = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { field, .. }) if field == "diff[1].check"
        ));
    }

    #[test]
    fn test_validate_bad_pattern() {
        let mut config = Config::default();
        config.diff[0].pattern = "[".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_validate_zero_max_arg_length() {
        let config = Config {
            max_arg_length: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp = TempDir::new().expect("temp dir");
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).expect("create dirs");
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").expect("write config");

        let found = Config::find_config_file_from(&nested).expect("find config");
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_find_config_file_missing() {
        let temp = TempDir::new().expect("temp dir");
        let result = Config::find_config_file_from(temp.path());
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_from_missing_path() {
        let temp = TempDir::new().expect("temp dir");
        let result = Config::load_from(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[[diff]\n").expect("write config");

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }
}
