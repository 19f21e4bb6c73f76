//! Source dialect parsers.
//!
//! The graph builder and summary extractor only talk to [`SourceParser`], so a
//! new dialect is one more implementation registered in [`ParserRegistry`].

use crate::domain::ExportEntry;
use crate::error::Skipped;
use crate::utils::extension_of;

pub mod ecmascript;

pub use ecmascript::EcmaScriptParser;

/// Lexical and syntactic extraction for one source dialect.
pub trait SourceParser: Send + Sync {
    /// Short dialect name, used in logs and `info` output.
    fn dialect(&self) -> &'static str;

    /// File extensions (with leading dot) this parser understands.
    fn extensions(&self) -> &'static [&'static str];

    /// Relative module specifiers referenced by `content`, in source order.
    fn extract_imports(&self, content: &str) -> Vec<String>;

    /// Top-level exported declarations.
    ///
    /// # Errors
    ///
    /// Returns [`Skipped::ParseFailed`] when the syntax cannot be parsed; callers
    /// degrade instead of aborting.
    fn extract_exports(&self, content: &str) -> Result<Vec<ExportEntry>, Skipped>;
}

/// Picks the parser for a path by extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SourceParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(vec![Box::new(EcmaScriptParser::new())])
    }
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Box<dyn SourceParser>>) -> Self {
        Self { parsers }
    }

    pub fn for_path(&self, path: &str) -> Option<&dyn SourceParser> {
        let ext = extension_of(path);
        self.parsers.iter().find(|p| p.extensions().contains(&ext.as_str())).map(|p| p.as_ref())
    }

    pub fn dialects(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.dialect()).collect()
    }
}
