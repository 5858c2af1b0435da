//! formwright-kernel: the schema-driven form engine.
//!
//! This crate provides:
//!
//! - **Preflight**: structural checks of raw schema JSON
//! - **Validators**: the memoizing validator composition engine
//! - **Interpreter**: the field tree walker, visibility gates, field
//!   bindings and array controllers
//! - **Components**: component and layout registries and the render tree
//! - **Store**: the form-state store seam and an in-memory store
//! - **Kernel**: `FormKernel`, which ties a schema, its registries and a
//!   store together
//!
//! The engine is synchronous. Store mutators report which subscriptions
//! fired and the kernel delivers them before returning, so by the time a
//! call returns every condition and array reflects the committed values.

pub mod components;
pub mod error;
pub mod interpreter;
mod kernel;
pub mod preflight;
pub mod store;
pub mod validators;

pub use components::{
    ComponentKind, ComponentRegistry, Element, FormAction, LayoutKey, LayoutRegistry, RenderProps,
    Renderer,
};
pub use error::SchemaError;
pub use interpreter::FormOptions;
pub use kernel::{FormConfig, FormKernel};
pub use store::{FormState, FormStore, MemoryStore};
pub use validators::ValidatorEngine;

pub use formwright_types as types;
