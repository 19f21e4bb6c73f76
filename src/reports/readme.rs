//! README generation.

use crate::error::{GenerationError, LlmError, PipelineError};
use crate::llm::LlmBackend;
use crate::pipeline::Analysis;
use crate::scan::render_tree;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;

/// Path segments shown in the folder tree.
pub const TREE_DEPTH: usize = 3;

static MARKDOWN_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:markdown|md)?").expect("valid markdown fence regex"));

pub fn readme_prompt(digests: &[String], tree: &str) -> String {
    format!(
        "Write a clean, professional README.md for this project.

Guidelines:
- Include project description
- Include features list
- Include API endpoints (if any)
- Include folder structure
- Include setup instructions
- Include installation & running instructions
- Include tech stack
- Explain key modules
- Use GitHub-friendly markdown formatting
- Keep it concise but professional

Folder structure:
{tree}

Here are summaries of all files in the repo:
{}

Begin now:",
        digests.join("\n\n")
    )
}

/// Remove markdown fences the model wraps around the document.
pub fn clean_markdown(text: &str) -> String {
    MARKDOWN_FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Generate README markdown for the analysed repository.
///
/// # Errors
///
/// Backend failures, cancellation, and an empty document are fatal.
pub async fn generate_readme(
    backend: &dyn LlmBackend,
    analysis: &Analysis,
    root_name: &str,
    cancel: &CancellationToken,
) -> Result<String, PipelineError> {
    let digests: Vec<String> = analysis.summaries.values().map(|s| s.render()).collect();
    let tree = render_tree(root_name, analysis.files.iter().map(|f| f.path.as_str()), TREE_DEPTH);
    let prompt = readme_prompt(&digests, &tree);

    let failed = |source: GenerationError| PipelineError::Generation { context: "README generation", source };

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
        response = backend.complete(&prompt) => response.map_err(|e| failed(e.into()))?,
    };

    let content = clean_markdown(&response);
    if content.is_empty() {
        return Err(failed(LlmError::Empty.into()));
    }
    Ok(content)
}
