//! Array field controllers.
//!
//! A dynamic array mirrors the item list the store holds under its name:
//! one group of mounted nodes per item, reconciled by index whenever the
//! array value changes. A fixed array mounts a static list once, plus one
//! trailing `additionalItems` slot.

use std::collections::HashSet;
use std::sync::Arc;

use formwright_types::{FieldDescriptor, FieldEntry, FieldError, Validator};
use serde_json::{json, Map, Value};

use super::binding::descriptor_props;
use super::node::Node;
use super::walker::{mount_field, walk};
use super::{ViewContext, WalkContext};
use crate::components::{Element, FormAction, LayoutKey, LayoutRegistry, RenderProps, Renderer};
use crate::error::SchemaError;
use crate::store::{FieldId, SubscriptionId};

/// Scope an item descriptor's name under `item_path`.
///
/// Only the last `.` segment of `name` is kept, and a bare `items` segment
/// counts as empty: `name.nested` and `items.nested` both become
/// `{item_path}nested`. Without a name the item path itself is used.
pub fn rewrite_item_name(name: Option<&str>, item_path: &str) -> String {
    let segment = name.map(|n| n.rsplit('.').next().unwrap_or(n));
    match segment {
        None | Some("") | Some("items") => item_path.to_string(),
        Some(segment) => format!("{item_path}{segment}"),
    }
}

fn rewrite_entries(entries: &[FieldEntry], item_path: &str) -> Vec<FieldEntry> {
    entries
        .iter()
        .map(|entry| match entry {
            FieldEntry::Group(group) => FieldEntry::Group(rewrite_entries(group, item_path)),
            FieldEntry::Field(field) => {
                let mut field = field.as_ref().clone();
                field.name = Some(rewrite_item_name(field.name.as_deref(), item_path));
                field.key = Some(item_path.to_string());
                FieldEntry::from(field)
            }
        })
        .collect()
}

fn heading(col: &Arc<dyn Renderer>, tag: &str, text: &str) -> Element {
    let inner = Element::new(tag).with_children(vec![Element::text(text)]);
    col.render(&RenderProps::layout(LayoutKey::Col.as_str()).with_prop("xs", 12), vec![inner])
}

/// Layout renderers a dynamic array draws with, resolved when it mounts.
struct ArrayLayout {
    col: Arc<dyn Renderer>,
    form_group: Arc<dyn Renderer>,
    button: Arc<dyn Renderer>,
    button_group: Arc<dyn Renderer>,
    icon: Arc<dyn Renderer>,
    help_block: Arc<dyn Renderer>,
    wrapper: Arc<dyn Renderer>,
}

impl ArrayLayout {
    fn resolve(layouts: &LayoutRegistry) -> Result<Self, SchemaError> {
        Ok(Self {
            col: layouts.get(LayoutKey::Col)?,
            form_group: layouts.get(LayoutKey::FormGroup)?,
            button: layouts.get(LayoutKey::Button)?,
            button_group: layouts.get(LayoutKey::ButtonGroup)?,
            icon: layouts.get(LayoutKey::Icon)?,
            help_block: layouts.get(LayoutKey::HelpBlock)?,
            wrapper: layouts.get(LayoutKey::ArrayFieldWrapper)?,
        })
    }

    fn col(&self, xs: u8, class: Option<&str>, children: Vec<Element>) -> Element {
        let mut props = RenderProps::layout(LayoutKey::Col.as_str()).with_prop("xs", xs);
        if let Some(class) = class {
            props = props.with_prop("className", class);
        }
        self.col.render(&props, children)
    }

    fn button(&self, props: RenderProps, icon: RenderProps, action: FormAction) -> Element {
        let icon = self.icon.render(&icon, Vec::new());
        self.button.render(&props, vec![icon]).with_action(action)
    }
}

/// Array field with add and remove controls.
pub struct DynamicArray {
    name: String,
    props: Map<String, Value>,
    item_fields: Vec<FieldEntry>,
    item_default: Option<Value>,
    validator: Validator,
    field_id: FieldId,
    subscription: SubscriptionId,
    items: Vec<Vec<Node>>,
    layout: ArrayLayout,
    clear_on_unmount: bool,
}

impl DynamicArray {
    pub fn mount(
        field: &FieldDescriptor,
        name: String,
        ctx: &mut WalkContext<'_>,
    ) -> Result<Self, SchemaError> {
        let layout = ArrayLayout::resolve(ctx.layouts)?;
        let composed = ctx.validators.field_validator(field)?;
        let validator = ctx.validators.array(composed);

        let (field_id, fired) =
            ctx.store
                .register_field(&name, validator.clone(), field.initial_value.clone());
        ctx.fired(fired);
        let subscription = ctx.store.subscribe(&name);

        let mut array = Self {
            name,
            props: descriptor_props(field),
            item_fields: field.fields.clone(),
            item_default: field.item_default.clone(),
            validator,
            field_id,
            subscription,
            items: Vec::new(),
            layout,
            clear_on_unmount: ctx.options.clears(field),
        };
        if let Err(err) = array.reconcile(ctx) {
            array.clear_on_unmount = false;
            array.dispose(ctx);
            return Err(err);
        }
        Ok(array)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value appended by the add control.
    pub fn item_default(&self) -> Option<&Value> {
        self.item_default.as_ref()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Vec<Node>] {
        &self.items
    }

    /// Match mounted item groups to the store's current items.
    fn reconcile(&mut self, ctx: &mut WalkContext<'_>) -> Result<(), SchemaError> {
        let paths = ctx.store.items(&self.name);

        while self.items.len() > paths.len() {
            let index = self.items.len() - 1;
            if let Some(nodes) = self.items.pop() {
                for mut node in nodes {
                    node.dispose(ctx);
                }
            }
            tracing::debug!(array = %self.name, index, "array item unmounted");
        }

        for path in paths.iter().skip(self.items.len()) {
            let entries = rewrite_entries(&self.item_fields, path);
            let nodes = if entries.is_empty() {
                // No nested descriptors: the item renders with its remove
                // control only.
                Vec::new()
            } else {
                walk(&entries, ctx)?
            };
            self.items.push(nodes);
            tracing::debug!(array = %self.name, item = %path, "array item mounted");
        }
        Ok(())
    }

    pub fn notify(
        &mut self,
        fired: &HashSet<SubscriptionId>,
        ctx: &mut WalkContext<'_>,
    ) -> Result<(), SchemaError> {
        if fired.contains(&self.subscription) {
            self.reconcile(ctx)?;
        }
        for nodes in &mut self.items {
            for node in nodes {
                node.notify(fired, ctx)?;
            }
        }
        Ok(())
    }

    pub fn dispose(&mut self, ctx: &mut WalkContext<'_>) {
        ctx.store.unsubscribe(self.subscription);
        ctx.store.unregister_field(self.field_id);
        for nodes in self.items.drain(..) {
            for mut node in nodes {
                node.dispose(ctx);
            }
        }
        if self.clear_on_unmount {
            let fired = ctx.store.change(&self.name, None);
            ctx.fired(fired);
            tracing::debug!(array = %self.name, "array cleared on unmount");
        }
    }

    pub fn view(&self, view: ViewContext<'_>) -> Element {
        let layout = &self.layout;
        let mut children = Vec::new();

        if let Some(title) = self.props.get("title").and_then(Value::as_str) {
            children.push(heading(&layout.col, "h3", title));
        }
        if let Some(description) = self.props.get("description").and_then(Value::as_str) {
            children.push(heading(&layout.col, "p", description));
        }

        for (index, nodes) in self.items.iter().enumerate() {
            let fields: Vec<Element> = nodes.iter().flat_map(|n| n.view(view)).collect();
            let remove = layout.button(
                RenderProps::layout(LayoutKey::Button.as_str())
                    .with_prop("type", "button")
                    .with_prop("bsStyle", "danger"),
                RenderProps::layout(LayoutKey::Icon.as_str()).with_prop("name", "close"),
                FormAction::Remove {
                    name: self.name.clone(),
                    index,
                },
            );
            let controls = layout.button_group.render(
                &RenderProps::layout(LayoutKey::ButtonGroup.as_str())
                    .with_prop("className", "pull-right"),
                vec![remove],
            );
            let row = vec![
                layout.col(11, Some("final-form-array-item"), fields),
                layout.col(1, Some("final-form-group-controls"), vec![controls]),
            ];
            children.push(layout.wrapper.render(
                &RenderProps::layout(LayoutKey::ArrayFieldWrapper.as_str())
                    .with_prop("index", index),
                row,
            ));
        }

        let show_error = view.submit_failed || view.store.is_dirty(&self.name);
        if let Some(FieldError::Message(text)) = view.store.error(&self.name) {
            if show_error && !text.is_empty() {
                let help = layout.help_block.render(
                    &RenderProps::layout(LayoutKey::HelpBlock.as_str()),
                    vec![Element::text(text)],
                );
                children.push(layout.col(11, None, vec![help]));
            }
        }

        let add = layout.button(
            RenderProps::layout(LayoutKey::Button.as_str()).with_prop("type", "button"),
            RenderProps::layout(LayoutKey::Icon.as_str())
                .with_prop("type", "fa")
                .with_prop("name", "plus"),
            FormAction::Push {
                name: self.name.clone(),
            },
        );
        let add_group = layout.form_group.render(
            &RenderProps::layout(LayoutKey::FormGroup.as_str()),
            vec![layout.button_group.render(
                &RenderProps::layout(LayoutKey::ButtonGroup.as_str()),
                vec![add],
            )],
        );
        children.push(layout.col(1, Some("final-form-array-add-container"), vec![add_group]));

        Element::new("field-array")
            .with_prop("name", self.name.clone())
            .with_prop("items", json!(self.items.len()))
            .with_children(children)
    }
}

/// Static list of fields plus one trailing template slot.
pub struct FixedArray {
    name: String,
    props: Map<String, Value>,
    children: Vec<Node>,
    col: Arc<dyn Renderer>,
    wrapper: Arc<dyn Renderer>,
    clear_on_unmount: bool,
}

impl FixedArray {
    pub fn mount(
        field: &FieldDescriptor,
        name: String,
        ctx: &mut WalkContext<'_>,
    ) -> Result<Self, SchemaError> {
        let template = field
            .additional_items
            .as_deref()
            .ok_or_else(|| SchemaError::MissingAdditionalItems {
                field: name.clone(),
            })?;
        let col = ctx.layouts.get(LayoutKey::Col)?;
        let wrapper = ctx.layouts.get(LayoutKey::ArrayFieldWrapper)?;

        let mut children = walk(&field.fields, ctx)?;
        match mount_field(template, ctx) {
            Ok(node) => children.push(node),
            Err(err) => {
                for mut child in children {
                    child.dispose(ctx);
                }
                return Err(err);
            }
        }

        Ok(Self {
            name,
            props: descriptor_props(field),
            children,
            col,
            wrapper,
            clear_on_unmount: ctx.options.clears(field),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
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
        // Cleared slots leave nulls behind; drop the list as a whole.
        if self.clear_on_unmount {
            let fired = ctx.store.change(&self.name, None);
            ctx.fired(fired);
        }
    }

    pub fn view(&self, view: ViewContext<'_>) -> Element {
        let mut children = Vec::new();
        if let Some(title) = self.props.get("title").and_then(Value::as_str) {
            children.push(heading(&self.col, "h3", title));
        }
        if let Some(description) = self.props.get("description").and_then(Value::as_str) {
            children.push(heading(&self.col, "p", description));
        }
        children.extend(self.children.iter().flat_map(|c| c.view(view)));

        self.wrapper.render(
            &RenderProps {
                name: self.name.clone(),
                component: LayoutKey::ArrayFieldWrapper.as_str().to_string(),
                props: Map::new(),
                ..RenderProps::default()
            },
            children,
        )
    }
}
