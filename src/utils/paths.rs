//! Path normalization for repo-relative, forward-slash paths.
//!
//! Everything in the pipeline keys files by strings such as `src/api/client.ts`,
//! so these helpers work on `&str` instead of `Path` and never touch the filesystem.

pub fn normalize_path(path: &str) -> String {
    // Convert backslashes to forward slashes and normalize
    path.replace('\\', "/")
}

/// Directory part of a repo-relative path. Root-level files live in `"."`,
/// and the parent of `"."` is `"."`.
pub fn dirname(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => ".",
        Some((dir, _)) => dir,
        None => ".",
    }
}

/// Join `spec` onto `base_dir` and fold `.`/`..` segments.
///
/// Returns `None` when the result would climb above the repository root.
pub fn join_normalized(base_dir: &str, spec: &str) -> Option<String> {
    let spec = normalize_path(spec);
    let mut parts: Vec<&str> = Vec::new();

    let base = if base_dir == "." { "" } else { base_dir };
    for segment in base.split('/').chain(spec.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Lower-cased extension including the leading dot, or an empty string.
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => name[idx..].to_ascii_lowercase(),
    }
}
