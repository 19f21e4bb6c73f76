//! Prompt construction for test generation.

use crate::domain::{Batch, BatchItem};
use crate::utils::truncate_chars;

/// Expected output named in the corrective prompt for batch requests.
pub const NDJSON_EXPECTATION: &str =
    "NDJSON: one {\"file\": \"<path>\", \"test\": \"<jest_code>\"} object per line";

const BATCH_HEADER: &str = "SYSTEM: You are a high-performance code test generator.
OUTPUT FORMAT: NDJSON (Newline Delimited JSON).
STRICT RULES:
1. One valid JSON object per line.
2. Structure: {\"file\": \"<path>\", \"test\": \"<jest_code>\"}
3. Escape all quotes/newlines in \"test\" string.
4. Call the file's exported functions by name in the test.
5. NO MARKDOWN. NO EXPLANATIONS. ONLY JSON.";

/// Build the generation prompt for one batch. Source code is cut to
/// `code_chars` characters.
pub fn batch_prompt(batch: &Batch, code_chars: usize) -> String {
    let files: Vec<String> = batch.items.iter().map(|item| render_item(item, code_chars)).collect();
    format!(
        "{BATCH_HEADER}\n\nFILES TO PROCESS:\n{}\n\nGENERATE TESTS NOW (NDJSON):",
        files.join("\n\n")
    )
}

fn render_item(item: &BatchItem, code_chars: usize) -> String {
    let mut out = format!("FILE: {}\nSUMMARY:\n{}\n", item.file, item.summary);

    let ctx = &item.context;
    if !ctx.similar_files.is_empty() {
        out.push_str("RELATED FILES:\n");
        for scored in &ctx.similar_files {
            out.push_str(&format!("- {} (score {:.2})\n", scored.file, scored.score));
        }
    }
    if !ctx.imports.is_empty() {
        out.push_str(&format!("IMPORTS: {}\n", ctx.imports.join(", ")));
    }
    if !ctx.imported_by.is_empty() {
        out.push_str(&format!("IMPORTED BY: {}\n", ctx.imported_by.join(", ")));
    }

    out.push_str("CODE:\n");
    out.push_str(truncate_chars(&item.code, code_chars));
    out
}

/// Re-ask after an undecodable response.
pub fn corrective_prompt(original: &str, expected: &str) -> String {
    format!(
        "{original}\n\nYOUR PREVIOUS RESPONSE COULD NOT BE PARSED.\n\
         Return only {expected}. Return the bare structure with no prose, no \
         markdown, and no code fences."
    )
}
