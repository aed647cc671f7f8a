//! Staleness evaluation
//!
//! Modification-time comparison only: fast and dependency-free, at the cost
//! of the usual timestamp caveats. An artifact whose mtime equals its
//! source's reads as fresh, and clock skew can hide a real change. Content
//! hashing is deliberately out of scope.

use camino::Utf8Path;

use crate::Result;

/// Decide whether an artifact must be rebuilt from its source.
///
/// A missing artifact is always stale. Otherwise the artifact is stale iff
/// the source is strictly newer. A missing source is an I/O error: sources
/// are declared in the manifest and must exist.
pub fn needs_rebuild(source: &Utf8Path, artifact: &Utf8Path) -> Result<bool> {
    if !artifact.exists() {
        tracing::debug!("{} is missing, rebuild", artifact);
        return Ok(true);
    }

    let source_mtime = std::fs::metadata(source)?.modified()?;
    let artifact_mtime = std::fs::metadata(artifact)?.modified()?;
    let stale = source_mtime > artifact_mtime;
    if stale {
        tracing::debug!("{} is older than {}, rebuild", artifact, source);
    }

    Ok(stale)
}
