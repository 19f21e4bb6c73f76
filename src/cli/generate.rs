//! Generate command implementation

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::fs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::utils::{build_backend, cancel_on_ctrl_c, prepare, runtime, spinner, LlmArgs, SourceArgs};
use crate::config::CliOverrides;
use crate::generate::BatchState;
use crate::pipeline::TestPipeline;
use crate::render::{render_jsonl, write_artifacts, write_report, RunReport};

const DEFAULT_OUTPUT_DIR: &str = "repo-forge-out";

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Output directory for tests and the run report
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Files per LLM request
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Skip source files longer than this many characters
    #[arg(long, value_name = "CHARS")]
    pub max_file_chars: Option<usize>,

    /// Related files attached to each prompt
    #[arg(long, value_name = "K")]
    pub top_k: Option<usize>,

    /// Also write tests.jsonl next to the test files
    #[arg(long)]
    pub jsonl: bool,

    /// Omit the timestamp from report.json
    #[arg(long)]
    pub no_timestamp: bool,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let workspace = prepare(
        &args.source,
        &args.llm,
        CliOverrides {
            batch_size: args.batch_size,
            max_file_chars: args.max_file_chars,
            top_k: args.top_k,
            output_dir: args.output_dir.clone(),
            ..CliOverrides::default()
        },
    )?;
    let backend = build_backend(&workspace.config.llm, args.llm.replay.as_deref())?;
    let output_dir =
        workspace.config.output_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let cancel = CancellationToken::new();
    let pipeline =
        TestPipeline::new(workspace.config.clone(), backend.clone()).with_cancellation(cancel.clone());

    let progress = spinner(&format!("Generating tests for {} files", workspace.files.len()));
    let rt = runtime()?;
    let result = rt.block_on(async {
        cancel_on_ctrl_c(cancel.clone());
        pipeline
            .run(workspace.files, |outcome| {
                progress.set_message(format!("batch {} {:?}", outcome.index + 1, outcome.state));
            })
            .await
    });
    progress.finish_and_clear();
    let output = result?;

    let written = write_artifacts(&output_dir, &output.artifacts)?;
    let mut output_files = written.clone();
    if args.jsonl {
        fs::write(output_dir.join("tests.jsonl"), render_jsonl(&output.artifacts))
            .context("Failed to write tests.jsonl")?;
        output_files.push("tests.jsonl".to_string());
    }

    let report = RunReport {
        backend: backend.name(),
        config: pipeline.config(),
        scan: &workspace.stats,
        output: &output,
        output_files: &output_files,
    };
    write_report(&output_dir.join("report.json"), &report, !args.no_timestamp)?;

    let failed = output.outcomes.iter().filter(|o| o.state == BatchState::Failed).count();
    println!(
        "{} {} tests written to {}",
        style("✓").green().bold(),
        written.len(),
        output_dir.display()
    );
    println!(
        "  batches: {} ({} failed), diagnostics: {}",
        output.batches_total,
        failed,
        output.diagnostics.len()
    );
    if output.cancelled {
        println!("  {}", style("run was interrupted; results are partial").yellow());
    }
    Ok(())
}
