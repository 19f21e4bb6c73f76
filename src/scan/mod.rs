//! File scanning with gitignore support

pub mod scanner;
pub mod tree;

pub use scanner::{FileScanner, ScanStats};
pub use tree::render_tree;
