//! Core records shared by every pipeline stage, plus the run configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Source extensions the graph resolver tries, in order, after an exact match.
pub const RESOLVE_EXTENSIONS: &[&str] = &[".js", ".ts", ".jsx", ".tsx", ".mjs", ".cjs"];

/// Extensions the batcher accepts as generation targets.
pub const SOURCE_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs"];

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// A file handed over by the source collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Repo-relative, forward-slash path
    pub path: String,
    pub content: String,
    /// Length of `content` in characters
    pub size: usize,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let size = content.chars().count();
        Self { path: crate::utils::normalize_path(&path.into()), content, size }
    }
}

/// One exported declaration found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ExportEntry {
    Function(String),
    Class(String),
    Variable(String),
    Reexport(String),
    DefaultExport,
    /// Placeholder used when the file could not be parsed
    Unknown,
}

impl ExportEntry {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function(name)
            | Self::Class(name)
            | Self::Variable(name)
            | Self::Reexport(name) => Some(name),
            Self::DefaultExport | Self::Unknown => None,
        }
    }
}

impl fmt::Display for ExportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => write!(f, "function {name}"),
            Self::Class(name) => write!(f, "class {name}"),
            Self::Variable(name) => write!(f, "variable {name}"),
            Self::Reexport(name) => write!(f, "export {name}"),
            Self::DefaultExport => f.write_str("default export"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Compact structural digest of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub file: String,
    pub exports: Vec<ExportEntry>,
    pub dependencies: Vec<String>,
    pub size: usize,
    #[serde(default)]
    pub parse_failed: bool,
}

impl Summary {
    /// Names of exported function declarations, in declaration order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().filter_map(|entry| match entry {
            ExportEntry::Function(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Text digest stored in the context index and embedded in prompts.
    pub fn render(&self) -> String {
        let deps =
            if self.dependencies.is_empty() { "none".to_string() } else { self.dependencies.join(", ") };

        if self.parse_failed {
            return format!(
                "File: {}\nExports: unknown (parse failed)\nDependencies: {}",
                self.file, deps
            );
        }

        let exports = if self.exports.is_empty() {
            "none".to_string()
        } else {
            self.exports.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        };
        format!(
            "File: {}\nExports: {}\nDependencies: {}\nCode size: {} chars",
            self.file, exports, deps, self.size
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFile {
    pub file: String,
    pub score: f64,
}

/// Retrieval context attached to a batch item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedContext {
    #[serde(rename = "similarFiles")]
    pub similar_files: Vec<ScoredFile>,
    pub imports: Vec<String>,
    #[serde(rename = "importedBy")]
    pub imported_by: Vec<String>,
}

impl RankedContext {
    pub fn is_empty(&self) -> bool {
        self.similar_files.is_empty() && self.imports.is_empty() && self.imported_by.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub file: String,
    pub code: String,
    pub summary: String,
    pub context: RankedContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    /// Zero-based position in the run
    pub index: usize,
    pub items: Vec<BatchItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Candidate output decoded from an LLM response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub file: String,
    pub test: String,
}

/// An artifact that passed the validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedArtifact(GeneratedArtifact);

impl ValidatedArtifact {
    pub(crate) fn accept(artifact: GeneratedArtifact) -> Self {
        Self(artifact)
    }

    pub fn file(&self) -> &str {
        &self.0.file
    }

    pub fn test(&self) -> &str {
        &self.0.test
    }
}

/// Fused-score weights for the relevance ranker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub lexical: f64,
    pub dependency: f64,
    pub folder: f64,
    pub export_name: f64,
    pub top_k: usize,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self { lexical: 0.45, dependency: 0.25, folder: 0.15, export_name: 0.15, top_k: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchLimits {
    pub batch_size: usize,
    /// Files longer than this many characters are skipped, never truncated
    pub max_file_chars: usize,
    /// Source characters embedded per file in a generation prompt
    pub prompt_code_chars: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self { batch_size: 3, max_file_chars: 25_000, prompt_code_chars: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stream_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 1200,
            stream_max_tokens: 2000,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    #[serde(deserialize_with = "deserialize_extensions")]
    pub include_extensions: Vec<String>,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub exclude_globs: Vec<String>,
    pub max_file_bytes: u64,
    pub min_lines: usize,
    pub respect_gitignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_extensions: default_include_extensions().iter().map(|s| s.to_string()).collect(),
            exclude_globs: Vec::new(),
            max_file_bytes: 100 * 1024,
            min_lines: 20,
            respect_gitignore: true,
        }
    }
}

/// Run configuration. Every field has a default so partial files are valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub ranking: RankingWeights,
    pub batching: BatchLimits,
    pub llm: LlmConfig,
    pub output_dir: Option<PathBuf>,
}

pub fn default_include_extensions() -> &'static [&'static str] {
    &[".js", ".ts", ".jsx", ".tsx"]
}

/// Directory names the scanner never descends into.
pub fn default_ignored_dirs() -> &'static [&'static str] {
    &[
        "node_modules",
        "dist",
        "build",
        ".next",
        "coverage",
        ".git",
        "public",
        "assets",
        "vendor",
        "migrations",
    ]
}

/// Stems of tool configuration files (`<stem>.<ext>`) that are source-shaped
/// but not worth testing.
pub fn default_ignored_config_stems() -> &'static [&'static str] {
    &["vite.config", "next.config", "eslint.config", "jest.config", "tailwind.config", "postcss.config"]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accept `"a, b"` or `["a", "b"]`, trimming entries and dropping empties.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(v) => v,
    };
    Ok(raw.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

/// Like [`deserialize_string_list`], and guarantees a leading dot on each extension.
fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = deserialize_string_list(deserializer)?;
    Ok(list
        .into_iter()
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(exports: Vec<ExportEntry>, parse_failed: bool) -> Summary {
        Summary {
            file: "src/a.js".to_string(),
            exports,
            dependencies: vec!["src/b.js".to_string()],
            size: 42,
            parse_failed,
        }
    }

    #[test]
    fn test_export_entries_render_tagged_names() {
        assert_eq!(ExportEntry::Function("run".into()).to_string(), "function run");
        assert_eq!(ExportEntry::Class("Repo".into()).to_string(), "class Repo");
        assert_eq!(ExportEntry::Variable("x".into()).to_string(), "variable x");
        assert_eq!(ExportEntry::Reexport("y".into()).to_string(), "export y");
        assert_eq!(ExportEntry::DefaultExport.to_string(), "default export");
    }

    #[test]
    fn test_summary_render_lists_exports_and_deps() {
        let s = summary(
            vec![ExportEntry::Function("run".into()), ExportEntry::DefaultExport],
            false,
        );
        assert_eq!(
            s.render(),
            "File: src/a.js\nExports: function run, default export\nDependencies: src/b.js\nCode size: 42 chars"
        );
    }

    #[test]
    fn test_degraded_summary_keeps_dependencies() {
        let s = summary(vec![ExportEntry::Unknown], true);
        let text = s.render();
        assert!(text.contains("Exports: unknown (parse failed)"));
        assert!(text.contains("Dependencies: src/b.js"));
        assert!(!text.contains("Code size"));
    }

    #[test]
    fn test_function_names_skip_other_exports() {
        let s = summary(
            vec![
                ExportEntry::Class("A".into()),
                ExportEntry::Function("b".into()),
                ExportEntry::Variable("c".into()),
            ],
            false,
        );
        assert_eq!(s.function_names().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_ranked_context_serializes_camel_case_fields() {
        let ctx = RankedContext {
            similar_files: vec![ScoredFile { file: "b.js".into(), score: 1.5 }],
            imports: vec!["b.js".into()],
            imported_by: Vec::new(),
        };
        let value = serde_json::to_value(&ctx).expect("serialize");
        assert!(value.get("similarFiles").is_some());
        assert!(value.get("importedBy").is_some());
    }
}
