//! repo-forge: LLM-assisted unit test generation for JavaScript/TypeScript
//! repositories.
//!
//! The pipeline builds a relative-import dependency graph, per-file export
//! summaries and a retrieval index, ranks related files for each target,
//! batches targets into prompts, and keeps only generated tests that call an
//! exported function of their file. README, tech stack and API docs reports
//! reuse the same analysis.

pub mod batch;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod generate;
pub mod graph;
pub mod index;
pub mod llm;
pub mod parser;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod reports;
pub mod scan;
pub mod summary;
pub mod utils;
pub mod validate;

pub use domain::{Config, SourceFile, ValidatedArtifact};
pub use error::{Diagnostics, PipelineError};
pub use pipeline::{Analysis, PipelineOutput, TestPipeline};
