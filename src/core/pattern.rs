//! File patterns used as dispatch table keys.
//!
//! Patterns are shell-style globs with brace alternatives (`*.{ts,js}`).
//! `*` and `?` never cross a `/`. A pattern without a `/` is matched
//! against a file's base name, so `*.ts` picks up `src/deep/a.ts`; a pattern
//! with a `/` is matched against the repository-relative path.

use crate::core::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled dispatch pattern.
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    alternatives: Vec<Pattern>,
    match_base: bool,
}

impl FilePattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self> {
        let alternatives = expand_braces(source)
            .iter()
            .map(|alternative| {
                Pattern::new(alternative).map_err(|e| Error::InvalidPattern {
                    pattern: source.to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.to_string(),
            alternatives,
            match_base: !source.contains('/'),
        })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `path` (relative to the repository root) matches.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let subject = if self.match_base {
            match path.file_name() {
                Some(name) => Path::new(name),
                None => return false,
            }
        } else {
            path
        };

        self.alternatives
            .iter()
            .any(|pattern| pattern.matches_path_with(subject, MATCH_OPTIONS))
    }
}

impl std::fmt::Display for FilePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Expands `{a,b}` groups into one pattern per alternative.
///
/// Groups nest (`{a,b{c,d}}`). A brace pair without a top-level comma is
/// kept literally, as is an unbalanced brace.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close)) = find_group(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];

    split_top_level(&pattern[open + 1..close])
        .into_iter()
        .flat_map(|alternative| expand_braces(&format!("{prefix}{alternative}{suffix}")))
        .collect()
}

/// Finds the first `{...}` group that contains a top-level comma.
fn find_group(pattern: &str) -> Option<(usize, usize)> {
    let bytes = pattern.as_bytes();

    for (open, _) in pattern.match_indices('{') {
        let mut depth = 0usize;
        let mut has_comma = false;

        for (offset, &byte) in bytes[open..].iter().enumerate() {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        if has_comma {
                            return Some((open, open + offset));
                        }
                        break;
                    }
                },
                b',' if depth == 1 => has_comma = true,
                _ => {},
            }
        }
    }

    None
}

/// Splits a group body on commas that are not inside a nested group.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, byte) in body.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            },
            _ => {},
        }
    }

    parts.push(&body[start..]);
    parts
}
