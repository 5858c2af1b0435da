//! Test utilities for formwright.
//!
//! Provides renderers that echo what they receive into the produced
//! [`Element`], ready-made registries, and helpers for searching rendered
//! trees:
//! - `text-field` and `custom-component`: leaf fields
//! - `sub-form`: a container
//! - `invalid-component`: declared without a renderer
//! - every [`LayoutKey`], echoing its props

use std::sync::Once;

use formwright_kernel::{
    ComponentRegistry, Element, FormAction, FormConfig, FormKernel, LayoutKey, LayoutRegistry,
    RenderProps,
};
use serde_json::Value;

/// Install a fmt subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Leaf renderer: the element carries name, value, error text and dirty
/// flag as props, plus the descriptor props.
pub fn echo_field(props: &RenderProps, children: Vec<Element>) -> Element {
    let mut el = Element::new(props.component.clone())
        .with_prop("name", props.name.clone())
        .with_prop("dirty", props.dirty)
        .with_children(children);
    if let Some(value) = &props.value {
        el = el.with_prop("value", value.clone());
    }
    if let Some(text) = props.error.as_ref().and_then(|e| e.text()) {
        el = el.with_prop("error", text);
    }
    for (key, value) in &props.props {
        el.props.entry(key.clone()).or_insert_with(|| value.clone());
    }
    el
}

/// Layout and container renderer: tag, name and props, with children.
pub fn echo_layout(props: &RenderProps, children: Vec<Element>) -> Element {
    let mut el = Element::new(props.component.clone()).with_children(children);
    if !props.name.is_empty() {
        el = el.with_prop("name", props.name.clone());
    }
    for (key, value) in &props.props {
        el.props.insert(key.clone(), value.clone());
    }
    el
}

/// Registry with the standard test components.
pub fn component_registry() -> ComponentRegistry {
    let mut components = ComponentRegistry::new();
    components.register_field("text-field", echo_field);
    components.register_field("custom-component", echo_field);
    components.register_container("sub-form", echo_layout);
    components.declare("invalid-component");
    components
}

/// Registry with every layout key bound to [`echo_layout`].
pub fn layout_registry() -> LayoutRegistry {
    let mut layouts = LayoutRegistry::new();
    for key in LayoutKey::ALL {
        layouts.register(key, echo_layout);
    }
    layouts
}

/// Mount a JSON schema with the standard registries.
pub fn form(schema: Value, config: FormConfig) -> FormKernel {
    init_tracing();
    match FormKernel::from_json_str(&schema.to_string(), component_registry(), layout_registry(), config) {
        Ok(form) => form,
        Err(err) => panic!("schema failed to mount: {err:#}"),
    }
}

/// All elements in `roots` and below, depth first.
pub fn all_elements(roots: &[Element]) -> Vec<&Element> {
    roots.iter().flat_map(Element::descendants).collect()
}

/// The first element whose `name` prop is `name`.
pub fn find_named<'a>(roots: &'a [Element], name: &str) -> Option<&'a Element> {
    all_elements(roots).into_iter().find(|el| el.name() == Some(name))
}

/// `name` props of every element of kind `kind`, in tree order.
pub fn collect_names(roots: &[Element], kind: &str) -> Vec<String> {
    all_elements(roots)
        .into_iter()
        .filter(|el| el.kind == kind)
        .filter_map(|el| el.name().map(str::to_string))
        .collect()
}

/// Every action attached to an element, in tree order.
pub fn find_actions(roots: &[Element]) -> Vec<FormAction> {
    all_elements(roots)
        .into_iter()
        .filter_map(|el| el.action.clone())
        .collect()
}

/// Elements of kind `kind`.
pub fn count_kind(roots: &[Element], kind: &str) -> usize {
    all_elements(roots)
        .into_iter()
        .filter(|el| el.kind == kind)
        .count()
}

/// Text of every text node, in tree order.
pub fn texts(roots: &[Element]) -> Vec<String> {
    all_elements(roots)
        .into_iter()
        .filter(|el| el.kind == "#text")
        .filter_map(|el| el.prop("text").and_then(Value::as_str).map(str::to_string))
        .collect()
}
