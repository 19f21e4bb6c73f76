//! Readme command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::utils::{build_backend, cancel_on_ctrl_c, emit, prepare, runtime, spinner, LlmArgs, SourceArgs};
use crate::config::CliOverrides;
use crate::error::{Diagnostics, PipelineError};
use crate::parser::ParserRegistry;
use crate::pipeline::Analysis;
use crate::reports::generate_readme;

#[derive(Args)]
pub struct ReadmeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Write the README here instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReadmeArgs) -> Result<()> {
    let workspace = prepare(&args.source, &args.llm, CliOverrides::default())?;
    if workspace.files.is_empty() {
        return Err(PipelineError::NoEligibleFiles.into());
    }
    let backend = build_backend(&workspace.config.llm, args.llm.replay.as_deref())?;
    let analysis = Analysis::build(workspace.files, &ParserRegistry::default(), &mut Diagnostics::new());

    let cancel = CancellationToken::new();
    let progress = spinner("Writing README");
    let rt = runtime()?;
    let result = rt.block_on(async {
        cancel_on_ctrl_c(cancel.clone());
        generate_readme(backend.as_ref(), &analysis, &workspace.root_name, &cancel).await
    });
    progress.finish_and_clear();

    emit(args.output.as_deref(), &result?)
}
