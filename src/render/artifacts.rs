//! Writing accepted tests to disk.

use crate::domain::ValidatedArtifact;
use crate::utils::{extension_of, join_normalized};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Test file path for a source path: `src/app.js` -> `tests/src/app.test.js`.
///
/// Returns `None` for paths that climb out of the repository.
pub fn test_path_for(source: &str) -> Option<String> {
    let normalized = join_normalized(".", source)?;
    let ext = extension_of(&normalized);
    let stem = &normalized[..normalized.len() - ext.len()];
    let ext = if ext.is_empty() { ".js" } else { ext.as_str() };
    Some(format!("tests/{stem}.test{ext}"))
}

/// Write every artifact under `output_dir` and return the written paths,
/// relative to `output_dir`, in input order.
pub fn write_artifacts(output_dir: &Path, artifacts: &[ValidatedArtifact]) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let Some(relative) = test_path_for(artifact.file()) else {
            tracing::warn!("refusing to write test for unsafe path {}", artifact.file());
            continue;
        };

        let target = output_dir.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&target, artifact.test())
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::debug!("wrote {}", target.display());
        written.push(relative);
    }
    Ok(written)
}
