//! JSONL rendering of accepted tests

use crate::domain::ValidatedArtifact;
use crate::render::test_path_for;
use serde_json::Value;
use std::collections::BTreeMap;

/// One line per artifact with sorted keys: `file`, `test`, `test_path`.
pub fn render_jsonl(artifacts: &[ValidatedArtifact]) -> String {
    let mut lines = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        // BTreeMap keeps the keys in alphabetical order.
        let mut entry: BTreeMap<&str, Value> = BTreeMap::new();
        entry.insert("file", Value::String(artifact.file().to_string()));
        entry.insert("test", Value::String(artifact.test().to_string()));
        entry.insert(
            "test_path",
            test_path_for(artifact.file()).map(Value::String).unwrap_or(Value::Null),
        );

        if let Ok(line) = serde_json::to_string(&entry) {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}
