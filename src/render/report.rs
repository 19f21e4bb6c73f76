//! Run report JSON generation.

use crate::domain::{Config, REPORT_SCHEMA_VERSION};
use crate::generate::BatchState;
use crate::pipeline::PipelineOutput;
use crate::scan::ScanStats;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Everything the report describes about one generation run.
pub struct RunReport<'a> {
    pub backend: &'a str,
    pub config: &'a Config,
    pub scan: &'a ScanStats,
    pub output: &'a PipelineOutput,
    pub output_files: &'a [String],
}

pub fn build_report(run: &RunReport<'_>, include_timestamp: bool) -> Result<Value> {
    let mut sorted_output_files = run.output_files.to_vec();
    sorted_output_files.sort();

    let outcomes = &run.output.outcomes;
    let count = |state: BatchState| outcomes.iter().filter(|o| o.state == state).count();
    let batches: Vec<Value> = outcomes
        .iter()
        .map(|o| {
            let mut entry = json!({
                "index": o.index,
                "state": o.state,
                "attempts": o.attempts,
                "records": o.artifacts.len(),
            });
            if let Some(error) = &o.error {
                entry["error"] = Value::String(error.clone());
            }
            entry
        })
        .collect();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("backend".to_string(), Value::String(run.backend.to_string()));
    report.insert("scan".to_string(), serde_json::to_value(run.scan)?);
    report.insert(
        "generation".to_string(),
        json!({
            "files": run.output.files_total,
            "batches": run.output.batches_total,
            "accepted_batches": count(BatchState::Accepted),
            "failed_batches": count(BatchState::Failed),
            "validated_tests": run.output.artifacts.len(),
            "cancelled": run.output.cancelled,
        }),
    );
    report.insert("batches".to_string(), Value::Array(batches));
    report.insert("diagnostics".to_string(), serde_json::to_value(&run.output.diagnostics)?);
    report.insert("config".to_string(), serde_json::to_value(run.config)?);
    report.insert("output_files".to_string(), serde_json::to_value(sorted_output_files)?);
    Ok(Value::Object(report))
}

pub fn write_report(report_path: &Path, run: &RunReport<'_>, include_timestamp: bool) -> Result<()> {
    let report = build_report(run, include_timestamp)?;
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
