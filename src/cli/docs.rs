//! Docs command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::utils::{build_backend, cancel_on_ctrl_c, emit, prepare, runtime, spinner, LlmArgs, SourceArgs};
use crate::config::CliOverrides;
use crate::reports::generate_api_docs;

#[derive(Args)]
pub struct DocsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Write the JSON documentation here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: DocsArgs) -> Result<()> {
    let workspace = prepare(&args.source, &args.llm, CliOverrides::default())?;
    let backend = build_backend(&workspace.config.llm, args.llm.replay.as_deref())?;
    let code_chars = workspace.config.batching.prompt_code_chars;

    let cancel = CancellationToken::new();
    let progress = spinner("Extracting API documentation");
    let rt = runtime()?;
    let result = rt.block_on(async {
        cancel_on_ctrl_c(cancel.clone());
        generate_api_docs(backend.as_ref(), &workspace.files, code_chars, &cancel).await
    });
    progress.finish_and_clear();

    let docs = result?;
    emit(args.output.as_deref(), &serde_json::to_string_pretty(&docs)?)
}
