//! Info command implementation

use anyhow::Result;
use clap::Args;

use super::utils::{prepare, LlmArgs, SourceArgs};
use crate::batch::check_eligibility;
use crate::config::CliOverrides;
use crate::error::{Diagnostics, Stage};
use crate::parser::ParserRegistry;
use crate::pipeline::Analysis;
use crate::rank::RelevanceRanker;
use crate::scan::render_tree;

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show the ranked context and per-signal scores for this file
    #[arg(long, value_name = "FILE")]
    pub explain: Option<String>,

    /// Folder tree depth
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub tree_depth: usize,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let workspace = prepare(&args.source, &LlmArgs::default(), CliOverrides::default())?;
    let parsers = ParserRegistry::default();
    let mut diagnostics = Diagnostics::new();
    let analysis = Analysis::build(workspace.files, &parsers, &mut diagnostics);
    let limits = workspace.config.batching;

    println!("Repository: {}", workspace.root_name);
    println!("Root: {}", workspace.root.display());

    let stats = &workspace.stats;
    println!("Statistics:");
    println!("  Total files scanned: {}", stats.files_scanned);
    println!("  Files included: {}", stats.files_included);
    println!("  Files skipped (extension): {}", stats.files_skipped_extension);
    println!("  Files skipped (glob): {}", stats.files_skipped_glob);
    println!("  Files skipped (tool config): {}", stats.files_skipped_config);
    println!("  Files skipped (size): {}", stats.files_skipped_size);
    println!("  Files skipped (too short): {}", stats.files_skipped_short);
    println!("  Total bytes: {}", stats.total_bytes_included);
    println!("  Parsers: {}", parsers.dialects().join(", "));

    println!("Dependency graph:");
    println!("  Nodes: {}", analysis.graph.len());
    println!("  Edges: {}", analysis.graph.edge_count());
    let mut most_imported: Vec<(&String, usize)> =
        analysis.graph.iter().map(|(path, node)| (path, node.imported_by.len())).filter(|(_, n)| *n > 0).collect();
    most_imported.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (path, count) in most_imported.iter().take(5) {
        println!("  {path} <- {count} importers");
    }

    let eligible = analysis.files.iter().filter(|f| check_eligibility(f, &limits).is_ok()).count();
    let batches = eligible.div_ceil(limits.batch_size.max(1));
    println!("Generation targets: {eligible} files in {batches} batches");
    println!("Summaries: {} ({} parse failures)", analysis.summaries.len(), diagnostics.count(Stage::Summary));

    if let Some(target) = args.explain.as_deref() {
        let target = crate::utils::normalize_path(target);
        let Some(summary) = analysis.summaries.get(&target) else {
            anyhow::bail!("No scanned file named {target}");
        };
        let ranker = RelevanceRanker::with_weights(&analysis.index, &analysis.graph, workspace.config.ranking);
        let digest = summary.render();
        println!("\n{digest}");
        println!("Ranked context (lexical / dependency / folder / export => fused):");
        for (file, b) in ranker.explain(&target, &digest).iter().take(ranker.weights().top_k) {
            println!(
                "  {file}: {:.2} / {:.1} / {:.2} / {:.0} => {:.3}",
                b.lexical, b.dependency, b.folder, b.export_name, b.fused
            );
        }
    }

    let tree = render_tree(
        &workspace.root_name,
        analysis.files.iter().map(|f| f.path.as_str()),
        args.tree_depth,
    );
    println!("\n{tree}");
    Ok(())
}
