//! The form kernel: one loaded schema, mounted against one store.
//!
//! The kernel owns the registries, the validator engine and the mounted
//! node tree. Every mutation goes through it so store notifications are
//! dispatched to the gates and arrays that watch the changed paths.
//!
//! # Example
//!
//! ```ignore
//! use formwright_kernel::{FormConfig, FormKernel};
//!
//! let mut form = FormKernel::from_json_str(schema_json, components, layouts, FormConfig::default())?;
//! form.change("bar", Some("fuzz".into()))?;
//! let tree = form.render()?;
//! ```

use std::collections::{BTreeMap, HashSet};

use anyhow::Context;
use formwright_types::{FieldError, Schema};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::components::{
    ComponentRegistry, Element, FormAction, LayoutKey, LayoutRegistry, RenderProps,
};
use crate::error::SchemaError;
use crate::interpreter::{self, DynamicArray, FormOptions, Node, ViewContext, WalkContext};
use crate::preflight::check_schema;
use crate::store::path::set_in;
use crate::store::{FormState, FormStore, MemoryStore, SubscriptionId};
use crate::validators::ValidatorEngine;

/// Upper bound on notification rounds per mutation. Each round may fire
/// more subscriptions through clear-on-unmount writes; a schema whose
/// conditions keep toggling each other is cut off here.
const MAX_NOTIFY_ROUNDS: usize = 100;

/// Configuration for a form kernel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    /// Clear values of fields when they unmount.
    pub clear_on_unmount: bool,
    /// Render `field-array` fields as fixed arrays.
    pub has_fixed_items: bool,
    /// Initial values. They take precedence over the schema's
    /// `defaultValues`.
    pub initial_values: Map<String, Value>,
}

impl FormConfig {
    /// Config that clears values of unmounted fields.
    pub fn clearing() -> Self {
        Self {
            clear_on_unmount: true,
            ..Self::default()
        }
    }

    /// Config rendering every `field-array` as a fixed array.
    pub fn fixed_items() -> Self {
        Self {
            has_fixed_items: true,
            ..Self::default()
        }
    }

    /// Set the initial values.
    pub fn with_initial_values(mut self, values: Map<String, Value>) -> Self {
        self.initial_values = values;
        self
    }

    /// Parse a config from JSON.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse form config")
    }

    /// The render-time options nodes see.
    pub fn options(&self) -> FormOptions {
        FormOptions {
            clear_on_unmount: self.clear_on_unmount,
            has_fixed_items: self.has_fixed_items,
        }
    }
}

/// A mounted form.
pub struct FormKernel<S: FormStore = MemoryStore> {
    title: Option<String>,
    description: Option<String>,
    components: ComponentRegistry,
    layouts: LayoutRegistry,
    validators: ValidatorEngine,
    options: FormOptions,
    store: S,
    nodes: Vec<Node>,
}

impl FormKernel<MemoryStore> {
    /// Mount `schema` against a fresh in-memory store seeded with the
    /// schema's default values overlaid by the config's initial values.
    pub fn new(
        schema: Schema,
        components: ComponentRegistry,
        layouts: LayoutRegistry,
        config: FormConfig,
    ) -> Result<Self, SchemaError> {
        let mut initial = Value::Object(Map::new());
        for (name, value) in schema.default_values.iter().chain(&config.initial_values) {
            set_in(&mut initial, name, Some(value.clone()));
        }
        let store = MemoryStore::with_initial_tree(initial);
        Self::with_store(schema, components, layouts, config, store)
    }

    /// Check, parse and mount a JSON schema document.
    pub fn from_json_str(
        json: &str,
        components: ComponentRegistry,
        layouts: LayoutRegistry,
        config: FormConfig,
    ) -> anyhow::Result<Self> {
        let document: Value = serde_json::from_str(json).context("schema is not valid JSON")?;
        check_schema(&document, &components).context("schema failed pre-flight check")?;
        let schema: Schema = serde_json::from_value(document)
            .map_err(|e| SchemaError::Malformed(e.to_string()))
            .context("schema could not be read")?;
        Self::new(schema, components, layouts, config).context("schema could not be mounted")
    }
}

impl<S: FormStore> FormKernel<S> {
    /// Mount `schema` against a caller-provided store.
    ///
    /// The whole schema is checked before the first field mounts; a
    /// structural error leaves the store untouched.
    pub fn with_store(
        schema: Schema,
        components: ComponentRegistry,
        layouts: LayoutRegistry,
        config: FormConfig,
        store: S,
    ) -> Result<Self, SchemaError> {
        let options = config.options();
        let mut validators = ValidatorEngine::new();
        interpreter::check(
            &schema.fields,
            &components,
            &layouts,
            &mut validators,
            &options,
        )?;

        let mut kernel = Self {
            title: schema.title,
            description: schema.description,
            components,
            layouts,
            validators,
            options,
            store,
            nodes: Vec::new(),
        };

        let mut ctx = WalkContext {
            store: &mut kernel.store,
            components: &kernel.components,
            layouts: &kernel.layouts,
            validators: &mut kernel.validators,
            options: &kernel.options,
            pending: Vec::new(),
        };
        kernel.nodes = interpreter::walk(&schema.fields, &mut ctx)?;
        let pending = ctx.pending;
        tracing::debug!(
            nodes = kernel.nodes.len(),
            validators = kernel.validators.len(),
            "form mounted"
        );
        kernel.settle(pending)?;
        Ok(kernel)
    }

    /// Set (or with `None`, clear) one value.
    pub fn change(&mut self, path: &str, value: Option<Value>) -> Result<(), SchemaError> {
        let fired = self.store.change(path, value);
        self.settle(fired)
    }

    /// Apply several changes as one batch. Conditions only ever see the
    /// values after the whole batch.
    pub fn change_many(&mut self, changes: &[(String, Option<Value>)]) -> Result<(), SchemaError> {
        let fired = self.store.change_many(changes);
        self.settle(fired)
    }

    /// Execute an action taken from the render tree.
    pub fn dispatch(&mut self, action: &FormAction) -> Result<(), SchemaError> {
        match action {
            FormAction::Push { name } => self.push_item(name),
            FormAction::Remove { name, index } => self.remove_item(name, *index),
        }
    }

    /// Append the array's `itemDefault` to the dynamic array `name`.
    pub fn push_item(&mut self, name: &str) -> Result<(), SchemaError> {
        let Some(array) = self.find_array(name) else {
            tracing::warn!(array = %name, "push on an array that is not mounted");
            return Ok(());
        };
        let item = array.item_default().cloned();
        let fired = self.store.push(name, item);
        self.settle(fired)
    }

    /// Remove item `index` of the dynamic array `name`. The array stays an
    /// array, even when it becomes empty.
    pub fn remove_item(&mut self, name: &str, index: usize) -> Result<(), SchemaError> {
        let (removed, fired) = self.store.remove(name, index);
        if removed.is_none() {
            tracing::warn!(array = %name, index, "remove of a missing array item");
        }
        self.settle(fired)
    }

    /// The mounted dynamic array named `name`.
    pub fn find_array(&self, name: &str) -> Option<&DynamicArray> {
        self.nodes.iter().find_map(|node| node.find_array(name))
    }

    /// Names of every currently mounted leaf field.
    pub fn mounted_fields(&self) -> Vec<String> {
        self.nodes.iter().flat_map(Node::field_names).collect()
    }

    /// Rendered elements of the mounted fields, without the form wrapper.
    pub fn view(&self) -> Vec<Element> {
        let view = ViewContext {
            store: &self.store,
            submit_failed: self.store.state().submit_failed,
        };
        self.nodes.iter().flat_map(|node| node.view(view)).collect()
    }

    /// The full render tree, wrapped in the `FormWrapper` layout.
    pub fn render(&self) -> Result<Element, SchemaError> {
        let wrapper = self.layouts.get(LayoutKey::FormWrapper)?;
        let mut props = RenderProps::layout(LayoutKey::FormWrapper.as_str());
        if let Some(title) = &self.title {
            props = props.with_prop("title", title.clone());
        }
        if let Some(description) = &self.description {
            props = props.with_prop("description", description.clone());
        }
        Ok(wrapper.render(&props, self.view()))
    }

    pub fn state(&self) -> FormState {
        self.store.state()
    }

    pub fn values(&self) -> &Value {
        self.store.values()
    }

    pub fn value(&self, path: &str) -> Option<Value> {
        self.store.value(path)
    }

    pub fn error(&self, name: &str) -> Option<FieldError> {
        self.store.error(name)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validators(&self) -> &ValidatorEngine {
        &self.validators
    }

    /// Submit: the values when valid, otherwise the errors.
    pub fn submit(&mut self) -> Result<Value, BTreeMap<String, FieldError>> {
        self.store.submit()
    }

    /// Restore the initial values.
    pub fn reset(&mut self) -> Result<(), SchemaError> {
        let fired = self.store.reset();
        self.settle(fired)
    }

    /// Dispose the whole tree, releasing every registration and
    /// subscription the form holds in its store.
    pub fn unmount(&mut self) {
        let mut ctx = WalkContext {
            store: &mut self.store,
            components: &self.components,
            layouts: &self.layouts,
            validators: &mut self.validators,
            options: &self.options,
            pending: Vec::new(),
        };
        for mut node in self.nodes.drain(..) {
            node.dispose(&mut ctx);
        }
        tracing::debug!("form unmounted");
    }

    /// Deliver fired subscriptions until the tree is quiet.
    fn settle(&mut self, fired: Vec<SubscriptionId>) -> Result<(), SchemaError> {
        let mut pending = fired;
        let mut rounds = 0;
        while !pending.is_empty() {
            rounds += 1;
            if rounds > MAX_NOTIFY_ROUNDS {
                tracing::warn!(
                    rounds = MAX_NOTIFY_ROUNDS,
                    "notification did not settle, conditions may be toggling each other"
                );
                break;
            }
            let ids: HashSet<SubscriptionId> = pending.drain(..).collect();
            tracing::trace!(round = rounds, subscriptions = ids.len(), "dispatching notifications");

            let mut ctx = WalkContext {
                store: &mut self.store,
                components: &self.components,
                layouts: &self.layouts,
                validators: &mut self.validators,
                options: &self.options,
                pending: Vec::new(),
            };
            for node in &mut self.nodes {
                node.notify(&ids, &mut ctx)?;
            }
            pending = ctx.pending;
        }
        Ok(())
    }
}
