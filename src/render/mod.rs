//! Output rendering (test files, JSONL, run report)

pub mod artifacts;
pub mod jsonl;
pub mod report;

pub use artifacts::{test_path_for, write_artifacts};
pub use jsonl::render_jsonl;
pub use report::{build_report, write_report, RunReport};
