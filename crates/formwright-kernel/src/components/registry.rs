//! Component and layout registries.
//!
//! Both are explicit objects handed down the walk; there is no ambient
//! lookup. Component tags are resolved while the schema is walked, so an
//! unknown tag fails before anything mounts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use formwright_types::{FIELD_ARRAY, FIXED_LIST};

use super::element::{Element, RenderProps};
use crate::error::SchemaError;

/// Something that turns props and rendered children into an [`Element`].
pub trait Renderer: Send + Sync {
    fn render(&self, props: &RenderProps, children: Vec<Element>) -> Element;
}

impl<F> Renderer for F
where
    F: Fn(&RenderProps, Vec<Element>) -> Element + Send + Sync,
{
    fn render(&self, props: &RenderProps, children: Vec<Element>) -> Element {
        self(props, children)
    }
}

/// How the walker treats a registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Bound to one value in the store.
    Field,
    /// Groups its own nested `fields`, which are walked and handed to the
    /// renderer as children.
    Container,
}

enum Entry {
    Bound {
        kind: ComponentKind,
        renderer: Arc<dyn Renderer>,
    },
    /// Tag reserved without a renderer.
    Declared,
}

/// A resolved registry entry.
#[derive(Clone)]
pub struct ResolvedComponent {
    pub kind: ComponentKind,
    pub renderer: Arc<dyn Renderer>,
}

/// True for the two array tags the engine renders itself.
pub fn is_builtin_array(component: &str) -> bool {
    component == FIELD_ARRAY || component == FIXED_LIST
}

/// Registry of component renderers, keyed by component tag.
#[derive(Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Entry>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf field renderer.
    pub fn register_field(&mut self, tag: impl Into<String>, renderer: impl Renderer + 'static) {
        self.register_arc(tag, ComponentKind::Field, Arc::new(renderer));
    }

    /// Register a container renderer.
    pub fn register_container(
        &mut self,
        tag: impl Into<String>,
        renderer: impl Renderer + 'static,
    ) {
        self.register_arc(tag, ComponentKind::Container, Arc::new(renderer));
    }

    /// Register a renderer that's already in an Arc.
    pub fn register_arc(
        &mut self,
        tag: impl Into<String>,
        kind: ComponentKind,
        renderer: Arc<dyn Renderer>,
    ) {
        self.components
            .insert(tag.into(), Entry::Bound { kind, renderer });
    }

    /// Reserve a tag whose renderer has not been bound. Schemas using it fail
    /// with [`SchemaError::InvalidRenderer`].
    pub fn declare(&mut self, tag: impl Into<String>) {
        self.components.entry(tag.into()).or_insert(Entry::Declared);
    }

    /// Look up a component by tag.
    pub fn resolve(&self, tag: &str) -> Result<ResolvedComponent, SchemaError> {
        match self.components.get(tag) {
            Some(Entry::Bound { kind, renderer }) => Ok(ResolvedComponent {
                kind: *kind,
                renderer: Arc::clone(renderer),
            }),
            Some(Entry::Declared) => Err(SchemaError::InvalidRenderer {
                component: tag.to_string(),
            }),
            None => Err(SchemaError::UnknownComponent {
                component: tag.to_string(),
                registered: self.names().join(", "),
            }),
        }
    }

    /// Check that `tag` is usable in a schema without resolving it.
    pub fn check(&self, tag: &str) -> Result<(), SchemaError> {
        if is_builtin_array(tag) {
            return Ok(());
        }
        self.resolve(tag).map(|_| ())
    }

    /// Check if a tag is registered (bound or declared).
    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// List all tags.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .finish()
    }
}

/// The presentational pieces the array controller and the form wrapper use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayoutKey {
    Col,
    FormGroup,
    Button,
    ButtonGroup,
    Icon,
    HelpBlock,
    ArrayFieldWrapper,
    FormWrapper,
}

impl LayoutKey {
    pub const ALL: [LayoutKey; 8] = [
        LayoutKey::Col,
        LayoutKey::FormGroup,
        LayoutKey::Button,
        LayoutKey::ButtonGroup,
        LayoutKey::Icon,
        LayoutKey::HelpBlock,
        LayoutKey::ArrayFieldWrapper,
        LayoutKey::FormWrapper,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutKey::Col => "Col",
            LayoutKey::FormGroup => "FormGroup",
            LayoutKey::Button => "Button",
            LayoutKey::ButtonGroup => "ButtonGroup",
            LayoutKey::Icon => "Icon",
            LayoutKey::HelpBlock => "HelpBlock",
            LayoutKey::ArrayFieldWrapper => "ArrayFieldWrapper",
            LayoutKey::FormWrapper => "FormWrapper",
        }
    }
}

impl fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of layout renderers.
#[derive(Default)]
pub struct LayoutRegistry {
    layouts: HashMap<LayoutKey, Arc<dyn Renderer>>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: LayoutKey, renderer: impl Renderer + 'static) {
        self.layouts.insert(key, Arc::new(renderer));
    }

    pub fn get(&self, key: LayoutKey) -> Result<Arc<dyn Renderer>, SchemaError> {
        self.layouts
            .get(&key)
            .cloned()
            .ok_or(SchemaError::MissingLayout(key))
    }

    pub fn contains(&self, key: LayoutKey) -> bool {
        self.layouts.contains_key(&key)
    }
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.layouts.keys().copied().collect();
        keys.sort();
        f.debug_struct("LayoutRegistry").field("layouts", &keys).finish()
    }
}
