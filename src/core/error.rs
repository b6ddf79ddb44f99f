//! Error types for difflint.
//!
//! This module defines all errors that can abort a run. Linter failures are
//! not errors: they are findings, carried in [`RunResult`](crate::RunResult).

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in difflint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Field name that is invalid.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    /// `--base` and `--staged` were both given.
    #[error("The --base and --staged options are mutually exclusive")]
    MutuallyExclusive,

    /// A dispatch pattern could not be compiled.
    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Not in a Git repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// Git operation failed.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    /// None of the candidate base branches is an ancestor of `HEAD`.
    #[error(
        "Current branch is not an ancestor of any of the base branches: {}",
        .candidates.join(", ")
    )]
    NoBaseBranch {
        /// Every candidate that was tried, in order.
        candidates: Vec<String>,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new invalid configuration error.
    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the user can fix this by changing flags or config.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::MutuallyExclusive
                | Self::InvalidPattern { .. }
                | Self::NotGitRepo
                | Self::NoBaseBranch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Display tests
    // =========================================================================

    #[test]
    fn test_display_config_not_found() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/repo/difflint.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /repo/difflint.toml"
        );
    }

    #[test]
    fn test_display_config_invalid() {
        let err = Error::config_invalid("base_branches", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: base_branches - must not be empty"
        );
    }

    #[test]
    fn test_display_mutually_exclusive() {
        assert_eq!(
            Error::MutuallyExclusive.to_string(),
            "The --base and --staged options are mutually exclusive"
        );
    }

    #[test]
    fn test_display_invalid_pattern() {
        let err = Error::InvalidPattern {
            pattern: "src/[".to_string(),
            message: "invalid range pattern".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid file pattern 'src/[': invalid range pattern"
        );
    }

    #[test]
    fn test_display_no_base_branch_lists_every_candidate() {
        let err = Error::NoBaseBranch {
            candidates: vec![
                "origin/main".to_string(),
                "origin/master".to_string(),
                "upstream/main".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Current branch is not an ancestor of any of the base branches: \
             origin/main, origin/master, upstream/main"
        );
    }

    #[test]
    fn test_display_git_operation() {
        let err = Error::git("diff", "bad revision 'nope..HEAD'");
        assert_eq!(
            err.to_string(),
            "Git operation failed: diff - bad revision 'nope..HEAD'"
        );
    }

    #[test]
    fn test_display_io() {
        let err = Error::io("read config", std::io::Error::other("denied"));
        assert_eq!(err.to_string(), "I/O error: read config");
    }

    // =========================================================================
    // Classification tests
    // =========================================================================

    #[test]
    fn test_fatal_selection_errors_are_user_errors() {
        assert!(Error::MutuallyExclusive.is_user_error());
        assert!(Error::NoBaseBranch { candidates: vec![] }.is_user_error());
        assert!(Error::NotGitRepo.is_user_error());
    }

    #[test]
    fn test_internal_failures_are_not_user_errors() {
        assert!(!Error::git("diff", "boom").is_user_error());
        assert!(!Error::io("spawn", std::io::Error::other("x")).is_user_error());
        assert!(!Error::Internal {
            message: "x".into()
        }
        .is_user_error());
    }

    // =========================================================================
    // Error source chain tests
    // =========================================================================

    #[test]
    fn test_config_parse_with_source_has_source() {
        use std::error::Error as StdError;
        let toml_err = toml::from_str::<toml::Value>("bad [[[").expect_err("should fail");
        let err = Error::config_parse_with_source("msg", toml_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as StdError;
        let err = Error::io("x", std::io::Error::other("inner"));
        assert!(err.source().is_some());
    }
}
