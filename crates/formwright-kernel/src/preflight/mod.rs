//! Pre-flight structural check of schema documents.
//!
//! Runs on the raw JSON, before it is deserialized and long before anything
//! mounts. It catches:
//!
//! - **Shape**: the schema is an object with a `fields` array, each entry is
//!   a descriptor object or a group array
//! - **Components**: every `component` is registered with a renderer, or is
//!   one of the built-in array tags
//! - **Identity**: every descriptor has `name`, `key` or `title` (direct
//!   items of a dynamic array are named by their item path instead)
//! - **Conditions**: an object with a string `when` and a predicate; a
//!   `pattern` compiles
//! - **Validators**: `validate` is an array of objects with a known `type`
//! - **Data types**: `dataType` is a known type
//!
//! Nested `fields` and `additionalItems` are checked the same way.
//!
//! # Example
//!
//! ```ignore
//! use formwright_kernel::preflight::check_schema;
//!
//! let schema: serde_json::Value = serde_json::from_str(source)?;
//! check_schema(&schema, &components)?;
//! ```

mod walker;

use serde_json::Value;

use crate::components::ComponentRegistry;
use crate::error::SchemaError;

pub use walker::Preflight;

/// Check `schema` against `components`.
pub fn check_schema(schema: &Value, components: &ComponentRegistry) -> Result<(), SchemaError> {
    Preflight::new(components).check(schema)
}
