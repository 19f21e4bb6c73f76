//! Tolerant decoding of model output.
//!
//! Models wrap JSON in fences, add prose, and break lines. Decoding strips
//! fences first, then tries a whole-text or bracket-delimited array, then
//! line-delimited records.

use crate::domain::GeneratedArtifact;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z]*").expect("valid fence regex"));

/// Aggregate shape expected from a structured response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Array,
    Object,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Array => "a JSON array",
            Self::Object => "a JSON object",
        }
    }
}

/// Record as the model writes it; either field may be missing.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    test: Option<String>,
}

impl RawRecord {
    fn conforming(self) -> Option<GeneratedArtifact> {
        match (self.file, self.test) {
            (Some(file), Some(test)) if !file.trim().is_empty() && !test.trim().is_empty() => {
                Some(GeneratedArtifact { file: crate::utils::normalize_path(file.trim()), test })
            }
            _ => None,
        }
    }
}

/// Result of the line-delimited scan.
#[derive(Debug, Default)]
pub struct NdjsonScan {
    /// Records with a non-empty `file` and `test`
    pub records: Vec<GeneratedArtifact>,
    /// Whether any candidate line decoded at all
    pub decoded_any: bool,
}

/// Remove every code-fence marker (```` ``` ```` with an optional language tag).
pub fn strip_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Decode each line that starts with `{` as one record. Malformed lines are
/// skipped.
pub fn parse_ndjson(text: &str) -> NdjsonScan {
    let mut scan = NdjsonScan::default();
    for line in text.lines().map(str::trim).filter(|line| line.starts_with('{')) {
        match serde_json::from_str::<RawRecord>(line) {
            Ok(raw) => {
                scan.decoded_any = true;
                match raw.conforming() {
                    Some(record) => scan.records.push(record),
                    None => tracing::debug!("dropping record without file or test"),
                }
            }
            Err(e) => tracing::debug!("skipping malformed line: {e}"),
        }
    }
    scan
}

/// The slice from the first opening delimiter to the last closing one.
pub fn bracket_slice(text: &str, shape: Shape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Decode `text` as `T`: whole text first, then the bracket-delimited slice.
pub fn decode_structured<T: DeserializeOwned>(text: &str, shape: Shape) -> Option<T> {
    let cleaned = strip_fences(text);
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Some(value);
    }
    let slice = bracket_slice(&cleaned, shape)?;
    serde_json::from_str(slice).ok()
}

/// Decode a batch response into conforming records.
///
/// A valid array wins over the line scan, so pretty-printed arrays keep
/// every element. `None` means nothing in the text decoded; `Some(vec![])`
/// means the output decoded but carried no usable record.
pub fn decode_batch(text: &str) -> Option<Vec<GeneratedArtifact>> {
    let cleaned = strip_fences(text);
    if let Some(raw) = decode_structured::<Vec<RawRecord>>(&cleaned, Shape::Array) {
        return Some(raw.into_iter().filter_map(RawRecord::conforming).collect());
    }
    let scan = parse_ndjson(&cleaned);
    scan.decoded_any.then_some(scan.records)
}
