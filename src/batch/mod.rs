//! Eligibility filtering and fixed-size batching.

use crate::domain::{Batch, BatchItem, BatchLimits, RankedContext, SourceFile, SOURCE_EXTENSIONS};
use crate::error::{Diagnostics, PipelineError, Skipped, Stage};
use crate::rank::RelevanceRanker;
use crate::summary::Summaries;
use crate::utils::{
    extension_of, has_build_segment, has_test_marker, is_lock_file, is_non_code_extension,
};

/// Apply the three eligibility filters, in order.
pub fn check_eligibility(file: &SourceFile, limits: &BatchLimits) -> Result<(), Skipped> {
    let extension = extension_of(&file.path);
    if is_non_code_extension(&file.path) || is_lock_file(&file.path) {
        return Err(Skipped::NonCode);
    }
    if !SOURCE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Skipped::UnsupportedExtension { extension });
    }

    if has_build_segment(&file.path) {
        return Err(Skipped::BuildOutput);
    }
    if has_test_marker(&file.path) {
        return Err(Skipped::TestSource);
    }

    let chars = file.content.chars().count();
    if chars > limits.max_file_chars {
        return Err(Skipped::Oversized { chars, limit: limits.max_file_chars });
    }
    Ok(())
}

pub struct Batcher<'a> {
    files: &'a [SourceFile],
    summaries: &'a Summaries,
    ranker: &'a RelevanceRanker<'a>,
    limits: BatchLimits,
}

impl<'a> Batcher<'a> {
    pub fn new(
        files: &'a [SourceFile],
        summaries: &'a Summaries,
        ranker: &'a RelevanceRanker<'a>,
        limits: BatchLimits,
    ) -> Self {
        Self { files, summaries, ranker, limits }
    }

    /// Ranked context for one file, or the reason it is unavailable.
    fn context_for(&self, path: &str) -> Result<(String, RankedContext), Skipped> {
        let summary = self.summaries.get(path).ok_or(Skipped::ContextUnavailable)?;
        let digest = summary.render();
        let context = self.ranker.context_for(path, &digest);
        Ok((digest, context))
    }

    /// Partition eligible files, in file-set order, into batches of at most
    /// `batch_size` items. Only the last batch may be short.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoEligibleFiles`] when every file was filtered out.
    pub fn create_batches(&self, diagnostics: &mut Diagnostics) -> Result<Vec<Batch>, PipelineError> {
        let batch_size = self.limits.batch_size.max(1);
        let mut batches: Vec<Batch> = Vec::new();
        let mut current: Vec<BatchItem> = Vec::with_capacity(batch_size);

        for file in self.files {
            if let Err(reason) = check_eligibility(file, &self.limits) {
                if matches!(reason, Skipped::Oversized { .. }) {
                    tracing::warn!("Skipping oversized file {}: {}", file.path, reason);
                }
                diagnostics.skip(Stage::Batching, &file.path, &reason);
                continue;
            }

            let (summary, context) = match self.context_for(&file.path) {
                Ok(found) => found,
                Err(reason) => {
                    diagnostics.skip(Stage::Context, &file.path, &reason);
                    (String::new(), RankedContext::default())
                }
            };

            current.push(BatchItem {
                file: file.path.clone(),
                code: file.content.clone(),
                summary,
                context,
            });

            if current.len() >= batch_size {
                let items = std::mem::replace(&mut current, Vec::with_capacity(batch_size));
                batches.push(Batch { index: batches.len(), items });
            }
        }

        if !current.is_empty() {
            batches.push(Batch { index: batches.len(), items: current });
        }

        if batches.is_empty() {
            return Err(PipelineError::NoEligibleFiles);
        }

        tracing::info!("Created {} batches (batch size {})", batches.len(), batch_size);
        Ok(batches)
    }
}
