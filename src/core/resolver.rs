//! Base branch auto-detection.

use crate::core::error::{Error, Result};
use crate::core::git::{Vcs, HEAD};

/// Returns the first candidate that is an ancestor of HEAD.
///
/// Candidates are tried in order, stopping at the first match. If
/// none matches, the error lists every candidate. Git failures while probing
/// are propagated as-is.
pub fn resolve_base_branch<V: Vcs + ?Sized>(vcs: &V, candidates: &[String]) -> Result<String> {
    for candidate in candidates {
        if vcs.is_ancestor(candidate, HEAD)? {
            tracing::debug!(base = %candidate, "Resolved base branch");
            return Ok(candidate.clone());
        }
        tracing::debug!(candidate = %candidate, "Not an ancestor of HEAD");
    }

    Err(Error::NoBaseBranch {
        candidates: candidates.to_vec(),
    })
}
