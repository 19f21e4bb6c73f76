//! CLI override merging.

use crate::domain::Config;
use std::path::PathBuf;

/// Values given on the command line. `None` leaves the file/default value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub include_extensions: Option<Vec<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub max_file_bytes: Option<u64>,
    pub min_lines: Option<usize>,
    pub respect_gitignore: Option<bool>,
    pub batch_size: Option<usize>,
    pub max_file_chars: Option<usize>,
    pub top_k: Option<usize>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub output_dir: Option<PathBuf>,
}

fn normalize_extension(ext: String) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Apply `cli` on top of `config`.
pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(exts) = cli.include_extensions {
        config.scan.include_extensions = exts.into_iter().map(normalize_extension).collect();
    }
    if let Some(globs) = cli.exclude_globs {
        config.scan.exclude_globs = globs;
    }
    if let Some(v) = cli.max_file_bytes {
        config.scan.max_file_bytes = v;
    }
    if let Some(v) = cli.min_lines {
        config.scan.min_lines = v;
    }
    if let Some(v) = cli.respect_gitignore {
        config.scan.respect_gitignore = v;
    }

    // A zero batch size would never make progress.
    if let Some(v) = cli.batch_size.filter(|v| *v > 0) {
        config.batching.batch_size = v;
    }
    if let Some(v) = cli.max_file_chars {
        config.batching.max_file_chars = v;
    }
    if let Some(v) = cli.top_k {
        config.ranking.top_k = v;
    }

    if let Some(v) = cli.model {
        config.llm.model = v;
    }
    if let Some(v) = cli.base_url {
        config.llm.base_url = v;
    }
    if let Some(v) = cli.api_key_env {
        config.llm.api_key_env = v;
    }
    if cli.output_dir.is_some() {
        config.output_dir = cli.output_dir;
    }
    config
}
