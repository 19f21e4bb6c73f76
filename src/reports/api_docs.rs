//! API documentation extracted from controller files.

use super::null_as_default;
use crate::domain::SourceFile;
use crate::error::PipelineError;
use crate::generate::{request_structured, Shape};
use crate::llm::LlmBackend;
use crate::utils::truncate_chars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiRoute {
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub auth_required: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub params: BTreeMap<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub query: BTreeMap<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub body: BTreeMap<String, Value>,
    /// Status code to description
    #[serde(deserialize_with = "null_as_default")]
    pub responses: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerDocs {
    #[serde(deserialize_with = "null_as_default")]
    pub controller: String,
    #[serde(deserialize_with = "null_as_default")]
    pub routes: Vec<ApiRoute>,
}

/// Files whose path names them as controllers.
pub fn controller_files(files: &[SourceFile]) -> Vec<&SourceFile> {
    files.iter().filter(|f| f.path.to_lowercase().contains("controller")).collect()
}

pub fn api_docs_prompt(controllers: &[&SourceFile], code_chars: usize) -> String {
    let sections: Vec<String> = controllers
        .iter()
        .map(|c| format!("FILE: {}\n\n{}", c.path, truncate_chars(&c.content, code_chars)))
        .collect();

    format!(
        r#"You are an API documentation extractor.

Analyze the following controller files and extract structured API documentation.

### OUTPUT FORMAT (STRICT JSON ONLY):
Return a JSON array. Each item must be:

{{
  "controller": "string",
  "routes": [
    {{
      "method": "GET" | "POST" | "PUT" | "PATCH" | "DELETE",
      "path": "string",
      "description": "string",
      "authRequired": boolean,
      "params": {{ "...": "string" }},
      "query": {{ "...": "string" }},
      "body": {{ "...": "string" }},
      "responses": {{ "200": "string", "400": "string", "401": "string", "404": "string", "500": "string" }}
    }}
  ]
}}

### RULES
- RETURN ONLY VALID JSON. NO MARKDOWN.
- If authentication middleware is found, authRequired=true.
- Extract ALL routes.
- Infer params/body/query from destructuring.
- Skip nothing.

### CONTROLLER FILES:
{}"#,
        sections.join("\n\n---\n\n")
    )
}

/// Document every controller in `files`.
///
/// # Errors
///
/// [`PipelineError::NoControllers`] when no path mentions a controller; a
/// generation error when the response is not a JSON array after one retry.
pub async fn generate_api_docs(
    backend: &dyn LlmBackend,
    files: &[SourceFile],
    code_chars: usize,
    cancel: &CancellationToken,
) -> Result<Vec<ControllerDocs>, PipelineError> {
    let controllers = controller_files(files);
    if controllers.is_empty() {
        return Err(PipelineError::NoControllers);
    }
    tracing::info!("documenting {} controller files", controllers.len());

    let prompt = api_docs_prompt(&controllers, code_chars);
    request_structured(backend, &prompt, Shape::Array, cancel)
        .await
        .map_err(|source| PipelineError::Generation { context: "API documentation", source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedBackend;

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("src/controllers/user.controller.js", "export const getUser = (req, res) => {}"),
            SourceFile::new("src/services/user.service.js", "export function find() {}"),
            SourceFile::new("src/AuthController.ts", "export class AuthController {}"),
        ]
    }

    #[test]
    fn test_controllers_are_selected_case_insensitively() {
        let files = files();
        let paths: Vec<&str> = controller_files(&files).iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/controllers/user.controller.js", "src/AuthController.ts"]);
    }

    #[tokio::test]
    async fn test_no_controllers_is_fatal_without_a_call() {
        let backend = ScriptedBackend::default();
        let only_service = vec![SourceFile::new("src/service.js", "export function a() {}")];
        let err = generate_api_docs(&backend, &only_service, 10_000, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoControllers));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_routes_decode_from_bracketed_array() {
        let backend = ScriptedBackend::new([r#"Here is the documentation:
[{"controller": "user.controller.js", "routes": [
  {"method": "GET", "path": "/users/:id", "description": "Fetch a user", "authRequired": true,
   "params": {"id": "string"}, "query": null, "responses": {"200": "User", "404": "Not found"}}
]}]
Let me know if you need more."#]);
        let docs = generate_api_docs(&backend, &files(), 10_000, &CancellationToken::new())
            .await
            .expect("docs");

        assert_eq!(docs.len(), 1);
        let route = &docs[0].routes[0];
        assert_eq!(route.method, "GET");
        assert!(route.auth_required);
        assert_eq!(route.params["id"], "string");
        assert!(route.query.is_empty());
        assert!(route.body.is_empty());
        assert_eq!(route.responses.len(), 2);

        let prompt = &backend.prompts()[0];
        assert!(prompt.contains("FILE: src/controllers/user.controller.js"));
        assert!(!prompt.contains("user.service.js"));
    }
}
