//! Stack command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::utils::{build_backend, cancel_on_ctrl_c, emit, prepare, runtime, spinner, LlmArgs, SourceArgs};
use crate::config::CliOverrides;
use crate::error::{Diagnostics, PipelineError};
use crate::llm::{ForwardOutcome, StreamFrame};
use crate::parser::ParserRegistry;
use crate::pipeline::Analysis;
use crate::reports::{generate_tech_stack, stream_tech_stack};

/// Frames buffered between the model stream and stdout.
const SINK_CAPACITY: usize = 64;

#[derive(Args)]
pub struct StackArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Stream raw output as server-sent-event lines (`data: {...}`) instead of
    /// waiting for the decoded report
    #[arg(long)]
    pub stream: bool,

    /// Write the JSON report here instead of stdout (ignored with --stream)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: StackArgs) -> Result<()> {
    let workspace = prepare(&args.source, &args.llm, CliOverrides::default())?;
    if workspace.files.is_empty() {
        return Err(PipelineError::NoEligibleFiles.into());
    }
    let backend = build_backend(&workspace.config.llm, args.llm.replay.as_deref())?;
    let analysis = Analysis::build(workspace.files, &ParserRegistry::default(), &mut Diagnostics::new());
    let manifest = workspace.manifest.as_deref();

    let cancel = CancellationToken::new();
    let rt = runtime()?;

    if args.stream {
        let outcome = rt.block_on(async {
            cancel_on_ctrl_c(cancel.clone());
            let (tx, mut rx) = mpsc::channel::<StreamFrame>(SINK_CAPACITY);
            let printer = tokio::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    println!("data: {}\n", frame.payload());
                }
            });
            let outcome = stream_tech_stack(backend.as_ref(), &analysis, manifest, &tx, &cancel).await;
            drop(tx);
            let _ = printer.await;
            outcome
        });
        return match outcome {
            ForwardOutcome::Completed { .. } => Ok(()),
            ForwardOutcome::Failed => anyhow::bail!("tech stack stream failed"),
            ForwardOutcome::Cancelled => anyhow::bail!("tech stack stream cancelled"),
            ForwardOutcome::Closed => anyhow::bail!("output closed before the stream finished"),
        };
    }

    let progress = spinner("Analyzing tech stack");
    let result = rt.block_on(async {
        cancel_on_ctrl_c(cancel.clone());
        generate_tech_stack(backend.as_ref(), &analysis, manifest, &cancel).await
    });
    progress.finish_and_clear();

    let report = result?;
    emit(args.output.as_deref(), &serde_json::to_string_pretty(&report)?)
}
