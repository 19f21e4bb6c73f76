//! File classification helpers for detecting lock files, non-code assets,
//! test sources, and build output.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extensions that never contain testable source even when they slip past the
/// source-extension check (data, markup, style, lock, and image formats).
pub const NON_CODE_EXTENSIONS: &[&str] = &[
    ".json", ".md", ".mdx", ".css", ".scss", ".sass", ".less", ".html", ".htm", ".yml", ".yaml",
    ".toml", ".lock", ".svg", ".png", ".jpg", ".jpeg", ".gif", ".ico", ".webp", ".txt", ".map",
    ".d.ts",
];

/// Directory segments produced by bundlers, package managers, and coverage tools.
pub const BUILD_SEGMENTS: &[&str] =
    &["node_modules", "dist", "build", ".next", "out", "coverage", ".turbo", ".cache"];

/// Common patterns indicating test or spec sources
static TEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\.(test|spec)\.[a-z0-9]+$").expect("valid test suffix regex"),
        Regex::new(r"(?i)(^|/)__(tests|mocks)__/").expect("valid jest dir regex"),
        Regex::new(r"(?i)(^|/)(test|tests|spec|e2e)/").expect("valid test dir regex"),
    ]
});

/// Check if a file is a dependency lock file.
///
/// # Arguments
/// * `path` - Repo-relative path to check
///
/// # Returns
/// `true` if the filename matches a known lock file
pub fn is_lock_file(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();

    matches!(
        name.as_str(),
        "package-lock.json"
            | "yarn.lock"
            | "pnpm-lock.yaml"
            | "bun.lockb"
            | "npm-shrinkwrap.json"
            | "cargo.lock"
            | "composer.lock"
    )
}

/// Check whether a path ends with a known non-code extension.
///
/// Compound suffixes such as `.d.ts` are matched against the full file name.
pub fn is_non_code_extension(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
    NON_CODE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Check if a path looks like a test or spec source.
pub fn has_test_marker(path: &str) -> bool {
    TEST_PATTERNS.iter().any(|pattern| pattern.is_match(path))
}

/// Check if any directory segment of `path` is a build/output directory.
pub fn has_build_segment(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').collect();
    // The last segment is the file name, not a directory.
    segments.pop();
    segments.iter().any(|segment| BUILD_SEGMENTS.contains(&segment.to_ascii_lowercase().as_str()))
}
