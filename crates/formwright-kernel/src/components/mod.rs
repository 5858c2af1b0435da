//! Renderers, registries and the render tree.

mod element;
mod registry;

pub use element::{Element, FormAction, RenderProps};
pub use registry::{
    is_builtin_array, ComponentKind, ComponentRegistry, LayoutKey, LayoutRegistry, Renderer,
    ResolvedComponent,
};
