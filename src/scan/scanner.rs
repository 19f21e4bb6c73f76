//! File scanner implementation with gitignore support

use crate::domain::{default_ignored_config_stems, default_ignored_dirs, ScanConfig, SourceFile};
use crate::utils::normalize_path;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_included: usize,
    pub files_skipped_glob: usize,
    pub files_skipped_extension: usize,
    pub files_skipped_config: usize,
    pub files_skipped_size: usize,
    pub files_skipped_short: usize,
    pub files_skipped_unreadable: usize,
    pub total_bytes_included: u64,
}

impl ScanStats {
    pub fn files_skipped(&self) -> usize {
        self.files_skipped_glob
            + self.files_skipped_extension
            + self.files_skipped_config
            + self.files_skipped_size
            + self.files_skipped_short
            + self.files_skipped_unreadable
    }
}

/// Collects candidate source files from a local checkout.
pub struct FileScanner {
    root_path: PathBuf,
    include_extensions: Vec<String>,
    exclude_globs: Vec<String>,
    max_file_bytes: u64,
    min_lines: usize,
    respect_gitignore: bool,
    stats: ScanStats,
}

impl FileScanner {
    /// Create a new FileScanner with default settings.
    pub fn new(root_path: PathBuf) -> Self {
        Self::from_config(root_path, &ScanConfig::default())
    }

    pub fn from_config(root_path: PathBuf, config: &ScanConfig) -> Self {
        Self {
            root_path,
            include_extensions: config.include_extensions.clone(),
            exclude_globs: config.exclude_globs.clone(),
            max_file_bytes: config.max_file_bytes,
            min_lines: config.min_lines,
            respect_gitignore: config.respect_gitignore,
            stats: ScanStats::default(),
        }
    }

    /// Set file extensions to include (e.g., ".js", ".tsx")
    pub fn include_extensions(mut self, extensions: Vec<String>) -> Self {
        self.include_extensions = extensions;
        self
    }

    /// Set glob patterns to exclude
    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    pub fn max_file_bytes(mut self, max_bytes: u64) -> Self {
        self.max_file_bytes = max_bytes;
        self
    }

    /// Files with fewer lines than this are too small to be worth a test.
    pub fn min_lines(mut self, min_lines: usize) -> Self {
        self.min_lines = min_lines;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    fn build_exclude_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!("ignoring invalid exclude glob '{pattern}': {e}"),
            }
        }
        Ok(builder.build()?)
    }

    fn should_include_extension(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
        if ext.is_empty() {
            return false;
        }
        self.include_extensions.contains(&format!(".{ext}"))
    }

    fn is_tool_config(path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase();
        default_ignored_config_stems()
            .iter()
            .any(|stem| name.strip_prefix(stem).is_some_and(|rest| rest.starts_with('.')))
    }

    /// Scan the root and return eligible files with their contents.
    ///
    /// Files are returned in deterministic sorted order by relative path.
    pub fn scan(&mut self) -> Result<Vec<SourceFile>> {
        self.stats = ScanStats::default();

        if !self.root_path.is_dir() {
            anyhow::bail!("Source root is not a directory: {}", self.root_path.display());
        }

        let exclude_globset = self.build_exclude_globset()?;

        let dir_filter = |entry: &ignore::DirEntry| -> bool {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_str().unwrap_or("");
            !default_ignored_dirs().contains(&name)
        };

        let mut builder = WalkBuilder::new(&self.root_path);
        builder
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .follow_links(false)
            .hidden(false)
            .parents(true)
            .filter_entry(dir_filter);

        let mut files: Vec<SourceFile> = Vec::new();
        for entry_result in builder.build() {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("walk error: {e}");
                    continue;
                }
            };

            // Symlinks are never followed, and only regular files count.
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            self.stats.files_scanned += 1;

            let rel_path = match path.strip_prefix(&self.root_path) {
                Ok(p) => normalize_path(&p.to_string_lossy()),
                Err(_) => continue,
            };

            if exclude_globset.is_match(&rel_path) {
                self.stats.files_skipped_glob += 1;
                continue;
            }

            if !self.should_include_extension(path) {
                self.stats.files_skipped_extension += 1;
                continue;
            }

            if Self::is_tool_config(path) {
                self.stats.files_skipped_config += 1;
                continue;
            }

            let size = match path.metadata() {
                Ok(m) => m.len(),
                Err(_) => {
                    self.stats.files_skipped_unreadable += 1;
                    continue;
                }
            };
            if size > self.max_file_bytes {
                self.stats.files_skipped_size += 1;
                continue;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!("skipping unreadable file {rel_path}: {e}");
                    self.stats.files_skipped_unreadable += 1;
                    continue;
                }
            };

            if content.lines().count() < self.min_lines {
                self.stats.files_skipped_short += 1;
                continue;
            }

            self.stats.files_included += 1;
            self.stats.total_bytes_included += size;
            files.push(SourceFile::new(rel_path, content));
        }

        // Sort by relative path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Read the `package.json` manifest at the root, if any.
    pub fn read_manifest(&self) -> Result<Option<String>> {
        let path = self.root_path.join("package.json");
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    /// Get scanning statistics
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn lines(n: usize) -> String {
        (0..n).map(|i| format!("const v{i} = {i};\n")).collect()
    }

    #[test]
    fn test_scanner_basic() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/b.ts"), lines(25)).unwrap();
        fs::write(root.join("src/a.js"), lines(25)).unwrap();
        fs::write(root.join("main.py"), lines(25)).unwrap();
        fs::write(root.join("notes.txt"), lines(25)).unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.js", "src/b.ts"]);
        assert_eq!(scanner.stats().files_skipped_extension, 2);
    }

    #[test]
    fn test_scanner_skips_short_and_large_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("tiny.js"), lines(3)).unwrap();
        fs::write(root.join("huge.js"), lines(10_000)).unwrap();
        fs::write(root.join("ok.js"), lines(20)).unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "ok.js");
        assert_eq!(scanner.stats().files_skipped_short, 1);
        assert_eq!(scanner.stats().files_skipped_size, 1);
    }

    #[test]
    fn test_ignored_dirs_and_tool_configs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["node_modules/pkg", "dist", "public", "migrations", "src"] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("index.js"), lines(30)).unwrap();
        }
        fs::write(root.join("vite.config.ts"), lines(30)).unwrap();
        fs::write(root.join("jest.config.js"), lines(30)).unwrap();
        fs::write(root.join("src/viteconfig.js"), lines(30)).unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf()).respect_gitignore(false);
        let files = scanner.scan().unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/index.js", "src/viteconfig.js"]);
        assert_eq!(scanner.stats().files_skipped_config, 2);
    }

    #[test]
    fn test_exclude_globs_and_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("src/generated")).unwrap();
        fs::create_dir_all(root.join("scripts")).unwrap();
        fs::write(root.join(".gitignore"), "scripts/\n").unwrap();
        fs::write(root.join("src/app.js"), lines(30)).unwrap();
        fs::write(root.join("src/generated/api.js"), lines(30)).unwrap();
        fs::write(root.join("scripts/deploy.js"), lines(30)).unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf())
            .exclude_globs(vec!["src/generated/**".to_string()]);
        let files = scanner.scan().unwrap();

        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.js"]);
        assert_eq!(scanner.stats().files_skipped_glob, 1);
    }

    #[test]
    fn test_manifest_is_optional() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        assert!(scanner.read_manifest().unwrap().is_none());

        fs::write(temp_dir.path().join("package.json"), "{\"name\":\"demo\"}").unwrap();
        assert_eq!(scanner.read_manifest().unwrap().as_deref(), Some("{\"name\":\"demo\"}"));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let mut scanner = FileScanner::new(PathBuf::from("/definitely/not/here"));
        assert!(scanner.scan().is_err());
    }
}
