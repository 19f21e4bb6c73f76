//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Section name honoured when the settings live under a table.
const NESTED_SECTION: &str = "repo-forge";

const CANDIDATES: &[&str] = &[
    "repo-forge.toml",
    ".repo-forge.toml",
    "repo-forge.yml",
    ".repo-forge.yml",
    "repo-forge.yaml",
    ".repo-forge.yaml",
];

/// Load the run configuration for `source_root`.
///
/// An explicit `config_path` must exist and parse. An auto-discovered file
/// that fails to parse is reported with a warning and defaults are used.
pub fn load_config(source_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(source_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(config) => {
            tracing::debug!("loaded config from {}", config_file.display());
            Ok(config)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {:#}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = raw.get(NESTED_SECTION).cloned().unwrap_or(raw);
    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = raw.get(NESTED_SECTION).cloned().unwrap_or(raw);
    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(source_root: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| source_root.join(candidate)).find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_load_toml_config_sections() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join("repo-forge.toml"),
            "[batching]\nbatch_size = 5\n\n[ranking]\ntop_k = 2\n\n[llm]\nmodel = 'llama-3.3-70b'\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.batching.batch_size, 5);
        assert_eq!(cfg.batching.max_file_chars, 25_000);
        assert_eq!(cfg.ranking.top_k, 2);
        assert_eq!(cfg.ranking.lexical, 0.45);
        assert_eq!(cfg.llm.model, "llama-3.3-70b");
        assert_eq!(cfg.llm.api_key_env, "GROQ_API_KEY");
    }

    #[test]
    fn test_nested_section_in_yaml() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(
            tmp.path().join(".repo-forge.yml"),
            "repo-forge:\n  scan:\n    min_lines: 5\n    include_extensions: [js]\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.scan.min_lines, 5);
        assert_eq!(cfg.scan.include_extensions, vec![".js".to_string()]);
    }

    #[test]
    fn test_explicit_config_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[scan]\ninclude_extensions = 123\n").expect("write");

        let result = load_config(tmp.path(), Some(&path));
        assert!(result.is_err(), "explicit config with invalid type should return Err");
    }

    #[test]
    fn test_explicit_config_missing_file_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let result = load_config(tmp.path(), Some(&tmp.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_explicit_config_unsupported_extension_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.ini");
        fs::write(&path, "x=1").expect("write");
        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_auto_discovered_invalid_config_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("repo-forge.toml"), "[scan]\nexclude_globs = false\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_string_normalization_comma_separated() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("custom.toml");
        fs::write(
            &path,
            "[scan]\ninclude_extensions = \"js, TSX,  .mjs\"\nexclude_globs = \"src/gen/**, ,legacy/**\"\n",
        )
        .expect("write");

        let cfg = load_config(tmp.path(), Some(&path)).expect("config");
        let exts: HashSet<String> = cfg.scan.include_extensions.into_iter().collect();
        assert_eq!(exts, HashSet::from([".js".to_string(), ".tsx".to_string(), ".mjs".to_string()]));
        assert_eq!(cfg.scan.exclude_globs, vec!["src/gen/**".to_string(), "legacy/**".to_string()]);
    }
}
