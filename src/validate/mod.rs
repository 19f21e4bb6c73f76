//! Acceptance filter for generated tests.
//!
//! A generated test is kept only when it mentions at least one function the
//! target file exports. This is a cheap soundness check, not a guarantee the
//! test runs.

use crate::domain::{GeneratedArtifact, ValidatedArtifact};
use crate::error::{Diagnostics, Skipped, Stage};
use crate::summary::Summaries;

pub struct ValidationFilter<'a> {
    summaries: &'a Summaries,
}

impl<'a> ValidationFilter<'a> {
    pub fn new(summaries: &'a Summaries) -> Self {
        Self { summaries }
    }

    /// Check one artifact against its file's summary.
    pub fn check(&self, artifact: &GeneratedArtifact) -> Result<(), Skipped> {
        let summary = self.summaries.get(&artifact.file).ok_or(Skipped::UnknownFile)?;
        if summary.function_names().any(|name| artifact.test.contains(name)) {
            Ok(())
        } else {
            Err(Skipped::NoExportReference)
        }
    }

    /// Keep the artifacts that pass [`check`](Self::check), in input order.
    pub fn validate(
        &self,
        artifacts: Vec<GeneratedArtifact>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ValidatedArtifact> {
        let mut accepted = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            match self.check(&artifact) {
                Ok(()) => accepted.push(ValidatedArtifact::accept(artifact)),
                Err(reason) => diagnostics.skip(Stage::Validation, &artifact.file, &reason),
            }
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExportEntry, Summary};

    fn summaries() -> Summaries {
        let mut map = Summaries::new();
        map.insert(
            "src/math.js".to_string(),
            Summary {
                file: "src/math.js".to_string(),
                exports: vec![
                    ExportEntry::Function("add".to_string()),
                    ExportEntry::Class("Calculator".to_string()),
                ],
                dependencies: vec![],
                size: 40,
                parse_failed: false,
            },
        );
        map.insert(
            "src/const.js".to_string(),
            Summary {
                file: "src/const.js".to_string(),
                exports: vec![ExportEntry::Variable("PI".to_string())],
                dependencies: vec![],
                size: 20,
                parse_failed: false,
            },
        );
        map
    }

    fn artifact(file: &str, test: &str) -> GeneratedArtifact {
        GeneratedArtifact { file: file.to_string(), test: test.to_string() }
    }

    #[test]
    fn test_accepts_tests_that_reference_an_exported_function() {
        let map = summaries();
        let filter = ValidationFilter::new(&map);
        assert!(filter.check(&artifact("src/math.js", "expect(add(1, 2)).toBe(3)")).is_ok());
    }

    #[test]
    fn test_class_and_variable_names_do_not_count() {
        let map = summaries();
        let filter = ValidationFilter::new(&map);
        assert_eq!(
            filter.check(&artifact("src/math.js", "new Calculator()")),
            Err(Skipped::NoExportReference)
        );
        assert_eq!(
            filter.check(&artifact("src/const.js", "expect(PI).toBeDefined()")),
            Err(Skipped::NoExportReference)
        );
    }

    #[test]
    fn test_unknown_files_are_rejected() {
        let map = summaries();
        let filter = ValidationFilter::new(&map);
        assert_eq!(filter.check(&artifact("src/other.js", "add()")), Err(Skipped::UnknownFile));
    }

    #[test]
    fn test_validate_keeps_order_and_records_rejections() {
        let map = summaries();
        let filter = ValidationFilter::new(&map);
        let mut diags = Diagnostics::new();
        let accepted = filter.validate(
            vec![
                artifact("src/math.js", "add(1)"),
                artifact("src/nope.js", "add(1)"),
                artifact("src/math.js", "describe('add', () => {})"),
            ],
            &mut diags,
        );
        assert_eq!(accepted.len(), 2);
        assert!(accepted.iter().all(|a| a.file() == "src/math.js"));
        assert_eq!(diags.count(Stage::Validation), 1);
    }
}
