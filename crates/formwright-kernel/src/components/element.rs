//! The render tree handed to the UI layer.

use formwright_types::{FieldError, Validator};
use serde_json::{Map, Value};

/// A user action wired to an element, executed by
/// [`FormKernel::dispatch`](crate::FormKernel::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Append the array field's default item.
    Push { name: String },
    /// Remove one item of an array field.
    Remove { name: String, index: usize },
}

/// One node of the produced render tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Renderer-chosen tag.
    pub kind: String,
    pub props: Map<String, Value>,
    pub action: Option<FormAction>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// A bare text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new("#text").with_prop("text", text.into())
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn with_action(mut self, action: FormAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// The `name` prop, if the renderer set one.
    pub fn name(&self) -> Option<&str> {
        self.props.get("name").and_then(Value::as_str)
    }

    /// This element and all its descendants, depth first.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }
}

/// What a renderer receives.
#[derive(Debug, Clone, Default)]
pub struct RenderProps {
    /// Field name for field components; empty for layout pieces.
    pub name: String,
    /// Component tag (or layout key) being rendered.
    pub component: String,
    /// Descriptor props passed through untouched (label, title, custom keys).
    pub props: Map<String, Value>,
    /// Bound value, for leaf fields.
    pub value: Option<Value>,
    /// Current validation error, for leaf fields.
    pub error: Option<FieldError>,
    pub dirty: bool,
    /// The field's composed validator.
    pub validate: Option<Validator>,
}

impl RenderProps {
    /// Props for a layout piece.
    pub fn layout(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Self::default()
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }
}
