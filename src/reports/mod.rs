//! Single-shot repository reports: README, tech stack, and API docs.
//!
//! Each report is one prompt built from the analysed file set and one
//! structured (or markdown) response.

use serde::{Deserialize, Deserializer};

pub mod api_docs;
pub mod readme;
pub mod tech_stack;

pub use api_docs::{controller_files, generate_api_docs, ApiRoute, ControllerDocs};
pub use readme::{generate_readme, readme_prompt};
pub use tech_stack::{generate_tech_stack, stream_tech_stack, tech_stack_prompt, TechStackReport};

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
