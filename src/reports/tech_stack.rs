//! Tech stack report.

use crate::error::PipelineError;
use crate::generate::{request_structured, Shape};
use crate::llm::{stream_to_sink, ForwardOutcome, LlmBackend, StreamFrame};
use crate::pipeline::Analysis;
use crate::utils::truncate_chars;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Manifest characters embedded in the prompt.
const MANIFEST_CHARS: usize = 4_000;

/// Structured description of a project's technology choices. Every field is
/// optional in the model's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TechStackReport {
    #[serde(deserialize_with = "text_list")]
    pub languages: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub frameworks: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub package_manager: String,
    #[serde(deserialize_with = "text")]
    pub architecture: String,
    #[serde(deserialize_with = "text_list")]
    pub libraries: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub database: String,
    #[serde(deserialize_with = "text_list")]
    pub external_services: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub auth: String,
    #[serde(deserialize_with = "text")]
    pub file_upload: String,
    #[serde(deserialize_with = "text")]
    pub routing: String,
    #[serde(deserialize_with = "text")]
    pub error_handling: String,
    #[serde(deserialize_with = "text")]
    pub logging: String,
    #[serde(deserialize_with = "text_list")]
    pub env_vars: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub deployment: String,
    #[serde(deserialize_with = "text_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "text_list")]
    pub recommendations: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Text(String),
    List(Vec<String>),
    Flag(bool),
}

/// A string field; lists are joined and `null` is empty.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(s)) => s,
        Some(Loose::List(items)) => items.join(", "),
        Some(Loose::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

/// A list field; a bare string becomes a single item and `null` is empty.
fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::List(items)) => items,
        Some(Loose::Text(s)) if s.trim().is_empty() => Vec::new(),
        Some(Loose::Text(s)) => vec![s],
        Some(Loose::Flag(flag)) => vec![flag.to_string()],
        None => Vec::new(),
    })
}

pub fn tech_stack_prompt(analysis: &Analysis, manifest: Option<&str>) -> String {
    let files: Vec<String> = analysis
        .summaries
        .values()
        .map(|s| format!("FILE: {}\nSUMMARY:\n{}", s.file, s.render()))
        .collect();

    let manifest = match manifest {
        Some(text) => format!("\n\n### PACKAGE MANIFEST (package.json):\n{}", truncate_chars(text, MANIFEST_CHARS)),
        None => String::new(),
    };

    format!(
        r#"You are a senior software architect.

Analyze the following project files and return a STRICT JSON OBJECT describing the project's tech stack.

### OUTPUT FORMAT (STRICT JSON ONLY):
{{
  "languages": [],
  "frameworks": [],
  "packageManager": "",
  "architecture": "",
  "libraries": [],
  "database": "",
  "externalServices": [],
  "auth": "",
  "fileUpload": "",
  "routing": "",
  "errorHandling": "",
  "logging": "",
  "envVars": [],
  "deployment": "",
  "strengths": [],
  "weaknesses": [],
  "recommendations": []
}}

### IMPORTANT RULES:
- RETURN STRICT JSON ONLY. NO MARKDOWN. NO BACKTICKS.
- If something is unknown, return an empty array or empty string.
- Infer technologies from filenames, imports, and patterns.
- Do NOT add explanations outside JSON.

### PROJECT FILES:
{}{manifest}"#,
        files.join("\n\n-----\n\n")
    )
}

/// Request the report as one JSON object.
///
/// # Errors
///
/// Fails when the backend fails or the response stays undecodable after one
/// corrective retry.
pub async fn generate_tech_stack(
    backend: &dyn LlmBackend,
    analysis: &Analysis,
    manifest: Option<&str>,
    cancel: &CancellationToken,
) -> Result<TechStackReport, PipelineError> {
    let prompt = tech_stack_prompt(analysis, manifest);
    request_structured(backend, &prompt, Shape::Object, cancel)
        .await
        .map_err(|source| PipelineError::Generation { context: "tech stack report", source })
}

/// Stream the raw report text to `sink` as it is produced.
pub async fn stream_tech_stack(
    backend: &dyn LlmBackend,
    analysis: &Analysis,
    manifest: Option<&str>,
    sink: &mpsc::Sender<StreamFrame>,
    cancel: &CancellationToken,
) -> ForwardOutcome {
    let prompt = tech_stack_prompt(analysis, manifest);
    stream_to_sink(backend, &prompt, sink, cancel).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceFile;
    use crate::error::Diagnostics;
    use crate::llm::ScriptedBackend;
    use crate::parser::ParserRegistry;

    fn analysis() -> Analysis {
        let files = vec![SourceFile::new("src/app.js", "export function listen() {}\n")];
        Analysis::build(files, &ParserRegistry::default(), &mut Diagnostics::new())
    }

    #[test]
    fn test_loose_fields_are_normalized() {
        let report: TechStackReport = serde_json::from_str(
            r#"{"languages": "JavaScript", "database": null, "auth": ["JWT", "bcrypt"], "envVars": null, "unknownField": 1}"#,
        )
        .expect("decodes");
        assert_eq!(report.languages, vec!["JavaScript"]);
        assert_eq!(report.database, "");
        assert_eq!(report.auth, "JWT, bcrypt");
        assert!(report.env_vars.is_empty());
        assert!(report.frameworks.is_empty());
    }

    #[test]
    fn test_prompt_carries_manifest_and_summaries() {
        let prompt = tech_stack_prompt(&analysis(), Some("{\"dependencies\":{\"express\":\"^4\"}}"));
        assert!(prompt.contains("FILE: src/app.js"));
        assert!(prompt.contains("\"packageManager\": \"\""));
        assert!(prompt.contains("PACKAGE MANIFEST"));
        assert!(prompt.contains("express"));
        assert!(!tech_stack_prompt(&analysis(), None).contains("PACKAGE MANIFEST"));
    }

    #[tokio::test]
    async fn test_report_decodes_through_prose() {
        let backend = ScriptedBackend::new([
            "Sure! ```json\n{\"languages\": [\"JavaScript\"], \"frameworks\": [\"Express\"], \"packageManager\": \"npm\"}\n```",
        ]);
        let report = generate_tech_stack(&backend, &analysis(), None, &CancellationToken::new())
            .await
            .expect("report");
        assert_eq!(report.frameworks, vec!["Express"]);
        assert_eq!(report.package_manager, "npm");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_streaming_forwards_deltas_then_done() {
        let backend = ScriptedBackend::new(["{\"languages\": [\"TypeScript\"]}"]);
        let (tx, mut rx) = mpsc::channel(64);
        let outcome = stream_tech_stack(&backend, &analysis(), None, &tx, &CancellationToken::new()).await;
        drop(tx);
        assert!(matches!(outcome, ForwardOutcome::Completed { .. }));

        let mut text = String::new();
        let mut last = None;
        while let Some(frame) = rx.recv().await {
            if let StreamFrame::Content(delta) = &frame {
                text.push_str(delta);
            }
            last = Some(frame);
        }
        assert_eq!(text, "{\"languages\": [\"TypeScript\"]}");
        assert_eq!(last, Some(StreamFrame::Done));
    }
}
