//! Field binding adapter and container nodes.

use std::collections::HashSet;
use std::sync::Arc;

use formwright_types::{FieldDescriptor, Validator};
use serde_json::{Map, Value};

use super::node::Node;
use super::walker::walk;
use super::{ViewContext, WalkContext};
use crate::components::{Element, RenderProps, Renderer};
use crate::error::SchemaError;
use crate::store::{FieldId, SubscriptionId};

/// Props a renderer receives from a descriptor. `dataType` is consumed by
/// the validator and never passed on.
pub(crate) fn descriptor_props(field: &FieldDescriptor) -> Map<String, Value> {
    let mut props = field.props.clone();
    let named = [
        ("label", &field.label),
        ("title", &field.title),
        ("description", &field.description),
    ];
    for (key, value) in named {
        if let Some(value) = value {
            props.insert(key.to_string(), Value::String(value.clone()));
        }
    }
    props
}

/// A leaf field bound to one store value.
pub struct FieldBinding {
    name: String,
    component: String,
    props: Map<String, Value>,
    renderer: Arc<dyn Renderer>,
    validator: Validator,
    field_id: FieldId,
    clear_on_unmount: bool,
}

impl FieldBinding {
    /// Register `field` with the store under `name`.
    pub fn mount(
        field: &FieldDescriptor,
        name: String,
        renderer: Arc<dyn Renderer>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<Self, SchemaError> {
        let validator = ctx.validators.field_validator(field)?;
        let (field_id, fired) =
            ctx.store
                .register_field(&name, validator.clone(), field.initial_value.clone());
        ctx.fired(fired);
        tracing::trace!(name = %name, component = %field.component, "field mounted");

        Ok(Self {
            name,
            component: field.component.clone(),
            props: descriptor_props(field),
            renderer,
            validator,
            field_id,
            clear_on_unmount: ctx.options.clears(field),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Unregister, and clear the value when the field's policy says so.
    pub fn dispose(&mut self, ctx: &mut WalkContext<'_>) {
        ctx.store.unregister_field(self.field_id);
        if self.clear_on_unmount {
            let fired = ctx.store.change(&self.name, None);
            ctx.fired(fired);
            tracing::debug!(name = %self.name, "value cleared on unmount");
        }
    }

    pub fn view(&self, view: ViewContext<'_>) -> Element {
        let props = RenderProps {
            name: self.name.clone(),
            component: self.component.clone(),
            props: self.props.clone(),
            value: view.store.value(&self.name),
            error: view.store.error(&self.name),
            dirty: view.store.is_dirty(&self.name),
            validate: Some(self.validator.clone()),
        };
        self.renderer.render(&props, Vec::new())
    }
}

/// A registered container: its own `fields` are walked and handed to the
/// renderer as children.
pub struct ContainerNode {
    name: String,
    component: String,
    props: Map<String, Value>,
    renderer: Arc<dyn Renderer>,
    children: Vec<Node>,
}

impl ContainerNode {
    pub fn mount(
        field: &FieldDescriptor,
        name: String,
        renderer: Arc<dyn Renderer>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<Self, SchemaError> {
        let children = walk(&field.fields, ctx)?;
        Ok(Self {
            name,
            component: field.component.clone(),
            props: descriptor_props(field),
            renderer,
            children,
        })
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn notify(
        &mut self,
        fired: &HashSet<SubscriptionId>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<(), SchemaError> {
        for child in &mut self.children {
            child.notify(fired, ctx)?;
        }
        Ok(())
    }

    pub fn dispose(&mut self, ctx: &mut WalkContext<'_>) {
        for mut child in self.children.drain(..) {
            child.dispose(ctx);
        }
    }

    pub fn view(&self, view: ViewContext<'_>) -> Element {
        let children = self.children.iter().flat_map(|c| c.view(view)).collect();
        let props = RenderProps {
            name: self.name.clone(),
            component: self.component.clone(),
            props: self.props.clone(),
            ..RenderProps::default()
        };
        self.renderer.render(&props, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn props_carry_labels_but_not_data_type() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "component": "text-field",
            "name": "age",
            "label": "Age",
            "dataType": "integer",
            "placeholder": "42",
        }))
        .unwrap();

        let props = descriptor_props(&field);
        assert_eq!(props.get("label"), Some(&json!("Age")));
        assert_eq!(props.get("placeholder"), Some(&json!("42")));
        assert!(!props.contains_key("dataType"));
        assert!(!props.contains_key("name"));
    }
}
