//! Shared helpers for paths, file classification, and token estimates.

pub mod classify;
pub mod paths;
pub mod tokens;

pub use classify::{has_build_segment, has_test_marker, is_lock_file, is_non_code_extension};
pub use paths::{dirname, extension_of, join_normalized, normalize_path};
pub use tokens::{estimate_tokens, truncate_chars};
