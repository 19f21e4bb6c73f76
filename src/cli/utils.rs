//! Shared CLI plumbing: argument groups, workspace setup, backend and runtime.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, LlmConfig, SourceFile};
use crate::llm::{LlmBackend, OpenAiCompatibleClient, ScriptedBackend};
use crate::scan::{FileScanner, ScanStats};

/// Where to read sources from and how to filter them.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Local directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Path to config file (repo-forge.toml or .repo-forge.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Include only these extensions (comma-separated, e.g., '.js,.ts')
    #[arg(short = 'i', long, value_name = "EXTS")]
    pub include_ext: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Skip files larger than this (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Skip files with fewer lines than this
    #[arg(long, value_name = "LINES")]
    pub min_lines: Option<usize>,

    /// Ignore .gitignore rules
    #[arg(long)]
    pub no_gitignore: bool,
}

/// Language model selection.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// Model name sent to the chat completions endpoint
    #[arg(long, value_name = "MODEL", env = "REPO_FORGE_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "REPO_FORGE_BASE_URL")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    #[arg(long, value_name = "VAR")]
    pub api_key_env: Option<String>,

    /// Answer prompts from a JSON array of canned responses instead of the network
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,
}

/// Scanned sources plus the effective configuration.
pub struct Workspace {
    pub root: PathBuf,
    pub root_name: String,
    pub config: Config,
    pub files: Vec<SourceFile>,
    pub stats: ScanStats,
    pub manifest: Option<String>,
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Load config, apply CLI overrides, and scan the source root.
pub fn prepare(source: &SourceArgs, llm: &LlmArgs, extra: CliOverrides) -> Result<Workspace> {
    let root = source
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", source.path.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let file_config = load_config(&root, source.config.as_deref())?;
    let overrides = CliOverrides {
        include_extensions: parse_csv(&source.include_ext),
        exclude_globs: parse_csv(&source.exclude_glob),
        max_file_bytes: source.max_file_bytes,
        min_lines: source.min_lines,
        respect_gitignore: if source.no_gitignore { Some(false) } else { None },
        model: llm.model.clone(),
        base_url: llm.base_url.clone(),
        api_key_env: llm.api_key_env.clone(),
        ..extra
    };
    let config = merge_cli_with_config(file_config, overrides);

    let mut scanner = FileScanner::from_config(root.clone(), &config.scan);
    let files = scanner.scan()?;
    let stats = scanner.stats().clone();
    let manifest = scanner.read_manifest()?;
    tracing::info!("scanned {} files, kept {}", stats.files_scanned, files.len());

    let root_name = root.file_name().and_then(|n| n.to_str()).unwrap_or(".").to_string();
    Ok(Workspace { root, root_name, config, files, stats, manifest })
}

/// The replay backend when `replay` is given, else the HTTP client.
pub fn build_backend(config: &LlmConfig, replay: Option<&Path>) -> Result<Arc<dyn LlmBackend>> {
    if let Some(path) = replay {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay file {}", path.display()))?;
        let responses: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Replay file must be a JSON array of strings: {}", path.display()))?;
        return Ok(Arc::new(ScriptedBackend::new(responses)));
    }
    Ok(Arc::new(OpenAiCompatibleClient::from_config(config)?))
}

/// Single-threaded runtime: the only suspension points are backend calls.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Cancel `token` on Ctrl-C. Must be called inside the runtime.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing current work");
            token.cancel();
        }
    });
}

/// Spinner on an interactive stderr, hidden otherwise.
pub fn spinner(message: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Write `content` to `output`, or print it when no path is given.
pub fn emit(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
