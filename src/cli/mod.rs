//! Command-line interface for repo-forge
//!
//! `generate` writes unit tests; `readme`, `stack` and `docs` produce
//! single-shot reports; `info` shows the analysis without calling a model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::PipelineError;

mod docs;
mod generate;
mod info;
mod readme;
mod stack;
mod utils;

/// Generate unit tests, READMEs, tech stack reports and API docs for
/// JavaScript/TypeScript repositories
#[derive(Parser)]
#[command(name = "repo-forge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Jest unit tests for the repository's source files
    Generate(Box<generate::GenerateArgs>),

    /// Write a README.md from file summaries and the folder layout
    Readme(readme::ReadmeArgs),

    /// Produce a structured tech stack report
    Stack(stack::StackArgs),

    /// Extract API documentation from controller files
    Docs(docs::DocsArgs),

    /// Display the dependency graph, summaries and ranking without calling a model
    Info(info::InfoArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Generate(args) => generate::run(*args),
        Commands::Readme(args) => readme::run(args),
        Commands::Stack(args) => stack::run(args),
        Commands::Docs(args) => docs::run(args),
        Commands::Info(args) => info::run(args),
    }
}

/// Exit code for a failed command: the pipeline status when a
/// [`PipelineError`] is anywhere in the chain, otherwise 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map(|pipeline| pipeline.status().exit_code())
        .unwrap_or(1)
}
